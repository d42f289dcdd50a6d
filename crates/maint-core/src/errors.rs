//! Errores del motor de ejecución.
//!
//! Sólo cubre errores de configuración y de integridad. Los `Fail`/`Warn`
//! de un step no son errores: viajan como `StepInterrupt` y el runner los
//! traduce al estado de la `Execution`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum EngineError {
    #[error("invalid options for step [{label}]: {message}")] InvalidOptions { label: String, message: String },
    #[error("param `{0}` already bound")] ParamAlreadyBound(String),
    #[error("step [{0}] was already executed")] AlreadyExecuted(String),
    #[error("trying to get execution information of [{0}] before the run started")] ExecutionNotStarted(String),
    #[error("checkpoint does not match step [{label}]: {reason}")] CheckpointMismatch { label: String, reason: String },
    #[error("step [{label}] aborted with an unexpected fault: {message}")] StepFault { label: String, message: String },
    #[error("next step decision {index} out of range ({offered} offered)")] InvalidDecision { index: usize, offered: usize },
    #[error("the runner is already in quit state")] RunnerQuit,
    #[error("serialization: {0}")] Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_step() {
        let e = EngineError::AlreadyExecuted("disk-space".into());
        assert_eq!(e.to_string(), "step [disk-space] was already executed");
        let e = EngineError::InvalidDecision { index: 3, offered: 2 };
        assert_eq!(e.to_string(), "next step decision 3 out of range (2 offered)");
    }
}
