//! Formato de checkpoint para reanudar una corrida interrumpida.
//!
//! El motor sólo define la forma serializable y el protocolo de
//! restauración; dónde se guarda es asunto del `CheckpointStore` que reciba
//! el runner.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::execution::ExecutionStatus;

/// Registro de un step: identidad y, si llegó a ejecutarse, su resultado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub label: String,
    pub param_values: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
}

/// Checkpoint de un escenario completo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCheckpoint {
    pub version: u32,
    pub run_id: Uuid,
    pub scenario: String,
    /// Hash de los fingerprints de los steps, en orden.
    pub definition_hash: String,
    pub saved_at: DateTime<Utc>,
    pub steps: Vec<CheckpointRecord>,
}

impl ScenarioCheckpoint {
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Almacenamiento de checkpoints, uno por label de escenario.
pub trait CheckpointStore {
    fn save(&mut self, checkpoint: ScenarioCheckpoint);
    fn load(&self, scenario: &str) -> Option<ScenarioCheckpoint>;
    fn clear(&mut self, scenario: &str);
}

#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    pub inner: HashMap<String, ScenarioCheckpoint>,
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn save(&mut self, checkpoint: ScenarioCheckpoint) {
        self.inner.insert(checkpoint.scenario.clone(), checkpoint);
    }

    fn load(&self, scenario: &str) -> Option<ScenarioCheckpoint> {
        self.inner.get(scenario).cloned()
    }

    fn clear(&mut self, scenario: &str) {
        self.inner.remove(scenario);
    }
}
