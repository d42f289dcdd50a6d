//! Demo no interactiva: compone un escenario de pre-upgrade sobre un host
//! simulado, lo ejecuta con `LogReporter` y termina con el exit code de la
//! corrida. `RUST_LOG=debug` muestra los logs del motor.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{error, info};
use maintflow::param::Param;
use maintflow::{Catalog, EngineError, Feature, LogReporter, ParamValues, RunStrategy, Runner, RunnerConfig, Scenario,
                ScenarioComposer, ScenarioMetadata, StepContext, StepDefinition, StepFilter, StepInterrupt,
                StepMetadata, StepRef, StepRegistry, StepResult};
use tracing_subscriber::EnvFilter;

/// Estado simulado del host compartido por los steps.
#[derive(Debug, Default)]
struct Host {
    free_mb: AtomicU64,
    cron_stopped: AtomicBool,
}

#[derive(Debug)]
struct DiskSpace(Arc<Host>);

impl StepDefinition for DiskSpace {
    fn metadata(&self) -> StepMetadata {
        StepMetadata::check("disk_space", "Check for free disk space").tags(["pre_upgrade"])
    }

    fn params(&self) -> Vec<Param> {
        vec![Param::integer("min_mb").describe("minimum free space in MB")
                                     .default_value(serde_json::json!(1024))]
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> StepResult {
        let min_mb: u64 = ctx.param_as("min_mb").map_err(|e| StepInterrupt::fault(e.to_string()))?;
        let free = self.0.free_mb.load(Ordering::SeqCst);
        ctx.say(format!("{free} MB free, {min_mb} MB required"));
        if free < min_mb {
            ctx.add_next_step(StepRef::kind(CleanCache(Arc::clone(&self.0))));
            return Err(StepInterrupt::fail(format!("only {free} MB free")));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct CleanCache(Arc<Host>);

impl StepDefinition for CleanCache {
    fn metadata(&self) -> StepMetadata {
        StepMetadata::procedure("clean_cache", "Clean package cache")
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> StepResult {
        self.0.free_mb.fetch_add(4096, Ordering::SeqCst);
        ctx.say("package cache removed");
        Ok(())
    }
}

#[derive(Debug)]
struct StopCron(Arc<Host>);

impl StepDefinition for StopCron {
    fn metadata(&self) -> StepMetadata {
        StepMetadata::procedure("stop_cron", "Stop cron service")
    }

    fn necessary(&self, _params: &ParamValues) -> bool {
        !self.0.cron_stopped.load(Ordering::SeqCst)
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> StepResult {
        self.0.cron_stopped.store(true, Ordering::SeqCst);
        ctx.say("cron stopped");
        Ok(())
    }
}

#[derive(Debug)]
struct NoRunningJobs(Arc<Host>);

impl StepDefinition for NoRunningJobs {
    fn metadata(&self) -> StepMetadata {
        StepMetadata::check("no_running_jobs", "Check for running background jobs").tags(["pre_upgrade"])
                                                                                  .for_feature("scheduler")
    }

    fn preparation_steps(&self, _params: &ParamValues) -> Vec<StepRef> {
        vec![StepRef::kind(StopCron(Arc::clone(&self.0)))]
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> StepResult {
        if !self.0.cron_stopped.load(Ordering::SeqCst) {
            ctx.set_warn("cron still running, new jobs may start");
        }
        Ok(())
    }
}

struct PreUpgrade<'a> {
    catalog: &'a StepRegistry,
}

impl ScenarioComposer for PreUpgrade<'_> {
    fn metadata(&self) -> ScenarioMetadata {
        ScenarioMetadata::new("pre_upgrade", "Checks before upgrading").tags(["pre_upgrade"])
                                                                       .run_strategy(RunStrategy::FailFast)
    }

    fn compose(&self, scenario: &mut Scenario) -> Result<(), EngineError> {
        scenario.add_steps(self.catalog.find_steps(&StepFilter::tags(["pre_upgrade"])).into_iter().map(StepRef::from))?;
        Ok(())
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run_demo() -> Result<i32, EngineError> {
    let host = Arc::new(Host { free_mb: AtomicU64::new(512),
                               ..Host::default() });
    let mut registry = StepRegistry::new();
    registry.register_feature(Feature::new("scheduler", "cron based job scheduler"))
            .register_step(DiskSpace(Arc::clone(&host)))
            .register_step(NoRunningJobs(Arc::clone(&host)));

    let config = RunnerConfig::from_env().with_assumeyes(true);
    let reporter = LogReporter::new().with_assumeyes(config.assumeyes);
    let mut runner = Runner::in_memory(reporter).with_config(config);

    let mut scenarios = vec![Scenario::compose(&PreUpgrade { catalog: &registry })?,
                             Scenario::filtered(StepFilter::label("disk-space"), &registry)?];
    let summary = runner.run(&mut scenarios)?;

    for scenario in &scenarios {
        info!("scenario [{}] state={:?} passed={} resolved={}",
              scenario.description(),
              scenario.state(),
              scenario.passed(),
              scenario.resolved_steps().len());
    }
    print!("{}", runner.reporter().output);
    println!("run {} finished: passed={} exit_code={}", summary.run_id, summary.passed, summary.exit_code);
    Ok(summary.exit_code)
}

fn main() -> ExitCode {
    init_logging();
    match run_demo() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(err) => {
            error!("demo aborted: {err}");
            ExitCode::from(2)
        }
    }
}
