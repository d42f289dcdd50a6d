//! Runner: ejecuta escenarios en orden, con sus preparaciones, y conduce el
//! protocolo de next steps.
//!
//! Todo es secuencial. El único punto de espera es `Reporter::on_next_steps`
//! (y la confirmación entre escenarios); con las mismas respuestas del
//! reporter una corrida produce siempre los mismos resultados.

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::checkpoint::{CheckpointStore, InMemoryCheckpointStore};
use crate::config::RunnerConfig;
use crate::errors::EngineError;
use crate::executable::Executable;
use crate::execution::Execution;
use crate::reporter::{Decision, NextStepDecision, Reporter};
use crate::scenario::{RunStrategy, Scenario, ScenarioState};
use crate::step::{StepInterrupt, StepKind, StepRef};

/// Resultado de `Runner::run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Todos los escenarios ejecutados pasaron y nadie salió.
    pub passed: bool,
    pub exit_code: i32,
    pub quit: bool,
    /// Labels de los escenarios que no llegaron a empezar.
    pub skipped_scenarios: Vec<String>,
}

/// Resumen del último escenario terminado, usado para confirmar el
/// siguiente.
#[derive(Debug, Clone)]
struct LastScenario {
    label: String,
    has_errors: bool,
    has_warnings: bool,
}

#[derive(Debug)]
pub struct Runner<R, S>
    where R: Reporter,
          S: CheckpointStore
{
    reporter: R,
    store: S,
    config: RunnerConfig,
    run_id: Uuid,
    quit: bool,
    exit_code: i32,
    last_scenario: Option<LastScenario>,
}

impl<R: Reporter> Runner<R, InMemoryCheckpointStore> {
    /// Runner con checkpoints en memoria.
    pub fn in_memory(reporter: R) -> Self {
        Self::new(reporter, InMemoryCheckpointStore::default())
    }
}

impl<R, S> Runner<R, S>
    where R: Reporter,
          S: CheckpointStore
{
    pub fn new(reporter: R, store: S) -> Self {
        Self { reporter,
               store,
               config: RunnerConfig::default(),
               run_id: Uuid::new_v4(),
               quit: false,
               exit_code: 0,
               last_scenario: None }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (R, S) {
        (self.reporter, self.store)
    }

    pub fn quit(&self) -> bool {
        self.quit
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Ejecuta `scenarios` en orden. Una vez que el runner sale (por decisión
    /// del operador o por errores en un escenario previo), los restantes no
    /// empiezan y se listan en `skipped_scenarios`.
    pub fn run(&mut self, scenarios: &mut [Scenario]) -> Result<RunSummary, EngineError> {
        info!("run:start run_id={} scenarios={}", self.run_id, scenarios.len());
        self.quit = false;
        self.exit_code = 0;
        self.last_scenario = None;

        let mut skipped_scenarios = Vec::new();
        for scenario in scenarios.iter_mut() {
            if self.quit {
                skipped_scenarios.push(scenario.label().to_string());
                continue;
            }
            self.run_scenario(scenario)?;
            if self.quit && scenario.state() == ScenarioState::NotStarted {
                skipped_scenarios.push(scenario.label().to_string());
            }
        }

        let summary = RunSummary { run_id: self.run_id,
                                   passed: self.exit_code == 0 && !self.quit,
                                   exit_code: self.exit_code,
                                   quit: self.quit,
                                   skipped_scenarios };
        info!("run:done run_id={} passed={} exit_code={} skipped={:?}",
              summary.run_id, summary.passed, summary.exit_code, summary.skipped_scenarios);
        Ok(summary)
    }

    /// Ejecuta un escenario precedido por sus escenarios de preparación.
    pub fn run_scenario(&mut self, scenario: &mut Scenario) -> Result<(), EngineError> {
        if self.quit {
            return Err(EngineError::RunnerQuit);
        }
        if scenario.steps().is_empty() {
            debug!("run_scenario:skip_empty label={}", scenario.label());
            return Ok(());
        }

        for mut before in scenario.before_scenarios()? {
            info!("run_scenario:preparation label={} for={}", before.label(), scenario.label());
            let result = self.run_scenario(&mut before);
            scenario.prepared.push(before);
            result?;
            if self.quit {
                return Ok(());
            }
        }

        if !self.confirm_scenario(scenario) {
            self.ask_to_quit();
            return Ok(());
        }

        info!("run_scenario:start label={} strategy={:?}", scenario.label(), scenario.run_strategy());
        scenario.state = ScenarioState::Running;
        self.reporter.before_scenario_starts(scenario);
        let result = self.execute_scenario_steps(scenario);
        self.reporter.after_scenario_finishes(scenario);

        self.last_scenario = Some(LastScenario { label: scenario.label().to_string(),
                                                 has_errors: !scenario.steps_with_error(Some(false)).is_empty(),
                                                 has_warnings: !scenario.steps_with_warning(Some(false)).is_empty() });
        if scenario.failed() {
            self.exit_code = 1;
        }
        info!("run_scenario:done label={} state={:?} passed={}",
              scenario.label(),
              scenario.state(),
              scenario.passed());
        result
    }

    /// Restaura desde el store los steps ya exitosos de `scenario`.
    pub fn restore(&mut self, scenario: &mut Scenario) -> Result<usize, EngineError> {
        match self.store.load(scenario.label()) {
            Some(checkpoint) => {
                let restored = scenario.load_checkpoint(&checkpoint)?;
                info!("restore:done label={} restored={} from_run={}", scenario.label(), restored, checkpoint.run_id);
                Ok(restored)
            }
            None => Ok(0),
        }
    }

    /// Decide si se puede empezar `scenario` según cómo terminó el anterior:
    /// errores no aceptados cortan la corrida, warnings se preguntan.
    fn confirm_scenario(&mut self, scenario: &Scenario) -> bool {
        let Some(last) = self.last_scenario.clone() else {
            return true;
        };
        if last.has_errors {
            warn!("confirm_scenario:previous_failed previous={} next={}", last.label, scenario.label());
            return false;
        }
        if last.has_warnings && !self.config.assumeyes {
            let decision = self.reporter.ask_decision(&format!("Continue with [{}]", scenario.description()));
            debug!("confirm_scenario:decision next={} decision={:?}", scenario.label(), decision);
            return decision == Decision::Yes;
        }
        true
    }

    fn ask_to_quit(&mut self) {
        self.exit_code = 1;
        self.quit = true;
    }

    fn execute_scenario_steps(&mut self, scenario: &mut Scenario) -> Result<(), EngineError> {
        let strategy = scenario.run_strategy();
        let count = scenario.steps().len();
        for index in 0..count {
            if self.quit {
                scenario.state = ScenarioState::Stopped;
                return Ok(());
            }

            let mut followups = Vec::new();
            let step = &mut scenario.steps_mut()[index];
            let restored = step.executed();
            let outcome = if restored {
                debug!("run_step:skip_restored label={} status={:?}", step.label(), step.status());
                Ok(true)
            } else {
                self.run_step(step, &mut followups, false)
            };
            let blocking = step.fail() && !step.whitelisted() && !step.resolved();
            let label = step.label().to_string();

            if !restored {
                scenario.followups.append(&mut followups);
                self.store.save(scenario.to_checkpoint(self.run_id));
            }

            if let Err(err) = outcome {
                error!("run_scenario:aborted label={} step={} error={}", scenario.label(), label, err);
                scenario.state = ScenarioState::Aborted;
                return Err(err);
            }
            if blocking && strategy == RunStrategy::FailFast {
                warn!("run_scenario:fail_fast label={} step={}", scenario.label(), label);
                scenario.state = ScenarioState::Stopped;
                return Ok(());
            }
        }
        scenario.state = if self.quit { ScenarioState::Stopped } else { ScenarioState::Completed };
        Ok(())
    }

    /// Ejecuta `step` y, si no termina en éxito, ofrece sus next steps.
    /// Devuelve `true` si el step terminó en éxito o quedó resuelto.
    fn run_step(&mut self,
                step: &mut Executable,
                followups: &mut Vec<Executable>,
                rerun: bool)
                -> Result<bool, EngineError> {
        if rerun {
            self.reporter.puts("Rerunning the check after fix procedure");
        }
        let whitelisted = self.config.is_whitelisted(&step.label_dashed());
        let execution = Execution::new(step.description(), whitelisted);
        debug!("run_step:start label={} whitelisted={}", step.label(), whitelisted);

        let result = step.execute_once(execution, &mut self.reporter, self.config.assumeyes)?;
        step.execution_mut()?.settle(&result);
        self.reporter.after_execution_finishes(step.execution()?);

        if let Err(StepInterrupt::Fault(message)) = result {
            error!("run_step:fault label={} message={}", step.label(), message);
            return Err(EngineError::StepFault { label: step.label().to_string(),
                                                message });
        }
        if step.success() {
            debug!("run_step:success label={}", step.label());
            return Ok(true);
        }
        warn!("run_step:problem label={} status={:?} output={:?}", step.label(), step.status(), step.output());

        let resolved = self.offer_next_steps(step, followups, rerun)?;
        if resolved {
            step.execution_mut()?.resolved = true;
            info!("run_step:resolved label={}", step.label());
        }
        Ok(resolved)
    }

    /// Protocolo de next steps. Un fallo queda resuelto si el step elegido
    /// termina bien y, para un check, una nueva ejecución del check también.
    fn offer_next_steps(&mut self,
                        step: &Executable,
                        followups: &mut Vec<Executable>,
                        rerun: bool)
                        -> Result<bool, EngineError> {
        if rerun && self.config.assumeyes {
            self.reporter.puts("Check still failing after attempt to fix. Skipping");
            return Ok(false);
        }
        if step.next_steps().is_empty() {
            return Ok(false);
        }

        let mut offered = step.next_steps()
                              .iter()
                              .cloned()
                              .map(StepRef::ensure_instance)
                              .collect::<Result<Vec<_>, _>>()?;
        let decision = self.reporter.on_next_steps(&offered);
        debug!("next_steps:decision label={} offered={} decision={:?}", step.label(), offered.len(), decision);

        match decision {
            NextStepDecision::Decline => {
                warn!("next_steps:declined label={}", step.label());
                Ok(false)
            }
            NextStepDecision::Quit => {
                self.ask_to_quit();
                Ok(false)
            }
            NextStepDecision::Run(index) if index >= offered.len() => {
                Err(EngineError::InvalidDecision { index,
                                                   offered: offered.len() })
            }
            NextStepDecision::Run(index) => {
                let mut chosen = offered.swap_remove(index);
                let fixed = self.run_step(&mut chosen, followups, false);
                followups.push(chosen);
                if !fixed? || self.quit {
                    return Ok(false);
                }
                if step.kind() != StepKind::Check {
                    return Ok(true);
                }
                let mut again = step.fresh()?;
                let passed = self.run_step(&mut again, followups, true);
                followups.push(again);
                passed
            }
        }
    }
}
