//! Escenarios: listas ordenadas de steps con una estrategia de fallo.
//!
//! Hay tres formas de construir uno:
//! - `Scenario::compose` a partir de un `ScenarioComposer` (escenarios
//!   declarados por el usuario);
//! - `Scenario::filtered` resolviendo checks del catálogo por label o tags;
//! - `Scenario::preparation` con los prerrequisitos de otro escenario.
//!
//! El runner es el único que cambia `state`, `prepared` y `followups`.

use chrono::Utc;
use indexmap::IndexSet;
use log::debug;
use once_cell::unsync::OnceCell;
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{Catalog, StepFilter};
use crate::checkpoint::ScenarioCheckpoint;
use crate::constants::{CHECKPOINT_VERSION, PREPARATION_DESCRIPTION};
use crate::errors::EngineError;
use crate::executable::Executable;
use crate::execution::ExecutionStatus;
use crate::hashing::hash_value;
use crate::step::StepRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStrategy {
    /// Un fallo no aceptado detiene los steps restantes del escenario.
    #[default]
    FailFast,
    /// Se ejecutan todos los steps; el fallo sólo se refleja al final.
    FailSlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detection {
    #[default]
    Auto,
    Manual,
}

/// Estado de un escenario dentro de una corrida.
///
/// Transiciones válidas:
/// - `NotStarted` -> `Running`
/// - `Running` -> `Completed` | `Stopped` | `Aborted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioState {
    #[default]
    NotStarted,
    Running,
    Completed,
    /// Terminado antes de tiempo por fail_fast o porque el operador salió.
    Stopped,
    /// Un step produjo un fallo fatal fuera del vocabulario fail/warn.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioMetadata {
    pub label: String,
    pub description: String,
    pub tags: Vec<String>,
    pub run_strategy: RunStrategy,
    pub detection: Detection,
}

impl ScenarioMetadata {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self { label: label.into(),
               description: description.into(),
               tags: Vec::new(),
               run_strategy: RunStrategy::default(),
               detection: Detection::default() }
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
        where I: IntoIterator<Item = T>,
              T: Into<String>
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn run_strategy(mut self, run_strategy: RunStrategy) -> Self {
        self.run_strategy = run_strategy;
        self
    }

    pub fn manual_detection(mut self) -> Self {
        self.detection = Detection::Manual;
        self
    }
}

/// Definición de un escenario concreto.
pub trait ScenarioComposer {
    fn metadata(&self) -> ScenarioMetadata;

    /// Agrega los steps con `add_step` / `add_steps`.
    fn compose(&self, _scenario: &mut Scenario) -> Result<(), EngineError> {
        Ok(())
    }

    /// Prerrequisitos propios del escenario, además de los de cada step.
    fn preparation_steps(&self) -> Vec<StepRef> {
        Vec::new()
    }
}

#[derive(Debug)]
pub struct Scenario {
    metadata: ScenarioMetadata,
    /// Vacío hasta el primer acceso sólo en escenarios de preparación.
    steps: OnceCell<Vec<Executable>>,
    candidates: Vec<Executable>,
    preparation: Vec<StepRef>,
    pub(crate) state: ScenarioState,
    pub(crate) prepared: Vec<Scenario>,
    pub(crate) followups: Vec<Executable>,
}

fn dashize(value: &str) -> String {
    value.replace('_', "-")
}

impl Scenario {
    pub fn new(metadata: ScenarioMetadata) -> Self {
        Self { metadata,
               steps: OnceCell::from(Vec::new()),
               candidates: Vec::new(),
               preparation: Vec::new(),
               state: ScenarioState::NotStarted,
               prepared: Vec::new(),
               followups: Vec::new() }
    }

    pub fn compose(composer: &dyn ScenarioComposer) -> Result<Self, EngineError> {
        let mut scenario = Self::new(composer.metadata());
        scenario.preparation = composer.preparation_steps();
        composer.compose(&mut scenario)?;
        debug!("scenario:composed label={} steps={}", scenario.label(), scenario.steps().len());
        Ok(scenario)
    }

    /// Checks del catálogo que cumplen `filter`, resueltos en este momento.
    pub fn filtered(filter: StepFilter, catalog: &dyn Catalog) -> Result<Self, EngineError> {
        let (label, description) = match &filter {
            StepFilter::Label(label) => {
                (format!("check_{label}"), format!("check with label [{}]", dashize(label)))
            }
            StepFilter::Tags(tags) => {
                let joined = tags.iter().map(|t| dashize(&format!("[{t}]"))).collect::<Vec<_>>().join(" ");
                (format!("checks_tagged_{}", tags.join("_")), format!("checks with tags {joined}"))
            }
        };
        let metadata = ScenarioMetadata::new(label, description).run_strategy(RunStrategy::FailSlow)
                                                                 .manual_detection();
        let mut scenario = Self::new(metadata);
        scenario.add_steps(catalog.find_steps(&filter).into_iter().map(StepRef::from))?;
        Ok(scenario)
    }

    /// Escenario con los prerrequisitos de `main`. El filtro `necessary` se
    /// aplica en el primer acceso a los steps, no aquí.
    pub fn preparation(main: &Scenario) -> Result<Self, EngineError> {
        let metadata = ScenarioMetadata::new(format!("preparation_of_{}", main.label()), PREPARATION_DESCRIPTION)
            .run_strategy(RunStrategy::FailSlow)
            .manual_detection();
        Ok(Self { steps: OnceCell::new(),
                  candidates: main.preparation_steps()?,
                  ..Self::new(metadata) })
    }

    pub fn add_step(&mut self, step: impl Into<StepRef>) -> Result<&mut Self, EngineError> {
        let executable = step.into().ensure_instance()?;
        match self.steps.get_mut() {
            Some(steps) => steps.push(executable),
            None => self.candidates.push(executable),
        }
        Ok(self)
    }

    pub fn add_steps<I, T>(&mut self, steps: I) -> Result<&mut Self, EngineError>
        where I: IntoIterator<Item = T>,
              T: Into<StepRef>
    {
        for step in steps {
            self.add_step(step)?;
        }
        Ok(self)
    }

    /// Prerrequisito declarado a nivel de escenario.
    pub fn add_preparation_step(&mut self, step: impl Into<StepRef>) -> &mut Self {
        self.preparation.push(step.into());
        self
    }

    pub fn metadata(&self) -> &ScenarioMetadata {
        &self.metadata
    }

    pub fn label(&self) -> &str {
        &self.metadata.label
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    pub fn run_strategy(&self) -> RunStrategy {
        self.metadata.run_strategy
    }

    pub fn state(&self) -> ScenarioState {
        self.state
    }

    pub fn steps(&self) -> &[Executable] {
        let candidates = &self.candidates;
        self.steps.get_or_init(|| {
                      let necessary: Vec<Executable> = candidates.iter().filter(|s| s.necessary()).cloned().collect();
                      debug!("scenario:resolved candidates={} necessary={}", candidates.len(), necessary.len());
                      necessary
                  })
    }

    pub(crate) fn steps_mut(&mut self) -> &mut [Executable] {
        self.steps();
        self.steps.get_mut().map(Vec::as_mut_slice).unwrap_or_default()
    }

    /// Escenarios de preparación que el runner ejecutó antes que éste.
    pub fn prepared(&self) -> &[Scenario] {
        &self.prepared
    }

    /// Next steps elegidos y re-ejecuciones de checks, en orden de
    /// finalización.
    pub fn followups(&self) -> &[Executable] {
        &self.followups
    }

    /// Prerrequisitos propios más los de cada step, sin duplicados y en
    /// orden de aparición.
    pub fn preparation_steps(&self) -> Result<Vec<Executable>, EngineError> {
        let mut seen: IndexSet<Executable> = IndexSet::new();
        for step in &self.preparation {
            seen.insert(step.clone().ensure_instance()?);
        }
        for step in self.steps() {
            seen.extend(step.preparation_steps()?);
        }
        Ok(seen.into_iter().collect())
    }

    /// Escenarios a ejecutar antes de éste: su preparación, si hay algún
    /// prerrequisito necesario.
    pub fn before_scenarios(&self) -> Result<Vec<Scenario>, EngineError> {
        let preparation = Self::preparation(self)?;
        if preparation.steps().is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![preparation])
        }
    }

    pub fn executed_steps(&self) -> Vec<&Executable> {
        self.steps().iter().filter(|s| s.executed()).collect()
    }

    /// Steps fallidos no resueltos. `whitelisted`: `None` sin filtro,
    /// `Some(true)` sólo aceptados, `Some(false)` sólo no aceptados.
    pub fn steps_with_error(&self, whitelisted: Option<bool>) -> Vec<&Executable> {
        self.problems(ExecutionStatus::Fail, whitelisted)
    }

    pub fn steps_with_warning(&self, whitelisted: Option<bool>) -> Vec<&Executable> {
        self.problems(ExecutionStatus::Warning, whitelisted)
    }

    fn problems(&self, status: ExecutionStatus, whitelisted: Option<bool>) -> Vec<&Executable> {
        self.executed_steps()
            .into_iter()
            .filter(|s| s.status() == Some(status) && !s.resolved())
            .filter(|s| whitelisted.map_or(true, |w| s.whitelisted() == w))
            .collect()
    }

    /// Steps cuyo fallo fue resuelto por un next step.
    pub fn resolved_steps(&self) -> Vec<&Executable> {
        self.executed_steps().into_iter().filter(|s| s.resolved()).collect()
    }

    pub fn passed(&self) -> bool {
        self.steps_with_error(Some(false)).is_empty() && self.steps_with_warning(Some(false)).is_empty()
    }

    pub fn failed(&self) -> bool {
        !self.passed()
    }

    /// Acepta los resultados ya ejecutados de los steps con `label`
    /// (guiones o guiones bajos). Devuelve cuántos se marcaron.
    pub fn whitelist(&mut self, label: &str) -> Result<usize, EngineError> {
        let wanted = dashize(label);
        let mut count = 0;
        for step in self.steps_mut().iter_mut().filter(|s| s.executed() && s.label_dashed() == wanted) {
            step.whitelist()?;
            count += 1;
        }
        Ok(count)
    }

    /// Hash de los fingerprints de los steps, en orden.
    pub fn definition_hash(&self) -> String {
        let fingerprints: Vec<Value> = self.steps().iter().map(|s| Value::String(s.fingerprint())).collect();
        hash_value(&Value::Array(fingerprints))
    }

    pub fn to_checkpoint(&self, run_id: Uuid) -> ScenarioCheckpoint {
        ScenarioCheckpoint { version: CHECKPOINT_VERSION,
                             run_id,
                             scenario: self.metadata.label.clone(),
                             definition_hash: self.definition_hash(),
                             saved_at: Utc::now(),
                             steps: self.steps().iter().map(Executable::to_checkpoint).collect() }
    }

    /// Restaura los steps exitosos de `checkpoint`. Los demás quedan sin
    /// ejecutar para que la corrida los reintente. Valida todo antes de
    /// modificar nada; devuelve cuántos steps se restauraron.
    pub fn load_checkpoint(&mut self, checkpoint: &ScenarioCheckpoint) -> Result<usize, EngineError> {
        let mismatch = |reason: String| EngineError::CheckpointMismatch { label: self.metadata.label.clone(),
                                                                           reason };
        if checkpoint.scenario != self.metadata.label {
            return Err(mismatch(format!("checkpoint belongs to scenario [{}]", checkpoint.scenario)));
        }
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(mismatch(format!("unsupported checkpoint version {}", checkpoint.version)));
        }
        if checkpoint.definition_hash != self.definition_hash() {
            return Err(mismatch("scenario steps changed since the checkpoint was saved".to_string()));
        }

        let mut targets = Vec::new();
        let mut cursor = 0;
        for record in &checkpoint.steps {
            let steps = self.steps();
            let position = steps[cursor..].iter()
                                          .position(|s| s.matches_checkpoint(record))
                                          .map(|offset| cursor + offset)
                                          .ok_or_else(|| mismatch(format!("no step matches record [{}]", record.label)))?;
            if record.status == Some(ExecutionStatus::Success) {
                if steps[position].executed() {
                    return Err(EngineError::AlreadyExecuted(steps[position].label().to_string()));
                }
                targets.push((position, record));
            }
            cursor = position + 1;
        }

        let steps = self.steps_mut();
        for (position, record) in &targets {
            steps[*position].restore_from_checkpoint(record)?;
        }
        debug!("scenario:checkpoint_loaded label={} restored={}", self.metadata.label, targets.len());
        Ok(targets.len())
    }
}
