//! maint-core: motor secuencial de checks y procedimientos de mantenimiento.
pub mod catalog;
pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod errors;
pub mod executable;
pub mod execution;
pub mod hashing;
pub mod param;
pub mod reporter;
pub mod runner;
pub mod scenario;
pub mod step;

pub use catalog::{Catalog, Feature, StepFilter, StepRegistry};
pub use checkpoint::{CheckpointRecord, CheckpointStore, InMemoryCheckpointStore, ScenarioCheckpoint};
pub use config::RunnerConfig;
pub use errors::EngineError;
pub use executable::Executable;
pub use execution::{Execution, ExecutionStatus};
pub use param::{Param, ParamKind, ParamValues};
pub use reporter::{Decision, LogReporter, NextStepDecision, Reporter};
pub use runner::{RunSummary, Runner};
pub use scenario::{Detection, RunStrategy, Scenario, ScenarioComposer, ScenarioMetadata, ScenarioState};
pub use step::{StepContext, StepDefinition, StepInterrupt, StepKind, StepMetadata, StepRef, StepResult};
