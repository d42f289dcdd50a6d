//! `Executable`: una instancia configurada de un step.
//!
//! Identidad = (tipo concreto, opciones crudas). Dos instancias con igual
//! tipo y opciones son iguales y tienen el mismo hash, lo que permite
//! deduplicar prerrequisitos aportados por varios steps.
//!
//! Ciclo de vida: `new` (valida y fija parámetros) -> `necessary` (opcional)
//! -> `execute_once` (una sola vez) -> `to_checkpoint`. Una instancia
//! restaurada con `restore_from_checkpoint` ya trae su `Execution` terminada y
//! no puede volver a ejecutarse.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value};

use crate::catalog::{Catalog, Feature};
use crate::checkpoint::CheckpointRecord;
use crate::errors::EngineError;
use crate::execution::{Execution, ExecutionStatus};
use crate::hashing::{hash_value, to_canonical_json};
use crate::param::ParamValues;
use crate::reporter::Reporter;
use crate::step::{StepContext, StepDefinition, StepKind, StepMetadata, StepRef, StepResult};

#[derive(Debug, Clone)]
pub struct Executable {
    definition: Arc<dyn StepDefinition>,
    metadata: StepMetadata,
    options: Map<String, Value>,
    param_values: ParamValues,
    next_steps: Vec<StepRef>,
    execution: Option<Execution>,
}

impl Executable {
    /// Construye la instancia validando `options` contra los parámetros
    /// declarados por `definition`.
    pub fn new(definition: Arc<dyn StepDefinition>, options: Map<String, Value>) -> Result<Self, EngineError> {
        let metadata = definition.metadata();
        let params = definition.params();

        let mut unknown: Vec<&str> = options.keys()
                                            .map(String::as_str)
                                            .filter(|k| !params.iter().any(|p| p.name == *k))
                                            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            let allowed: Vec<&str> = params.iter().map(|p| p.name).collect();
            return Err(EngineError::InvalidOptions { label: metadata.label.clone(),
                                                     message: format!("unknown options {:?}, allowed {:?}",
                                                                      unknown, allowed) });
        }

        let mut param_values = ParamValues::new();
        for param in &params {
            let value = param.process(&metadata.label, options.get(param.name))?;
            param_values.bind(param.name, value)?;
        }

        Ok(Self { definition,
                  metadata,
                  options,
                  param_values,
                  next_steps: Vec::new(),
                  execution: None })
    }

    /// Instancia con opciones vacías (defaults de cada parámetro).
    pub fn with_defaults(definition: Arc<dyn StepDefinition>) -> Result<Self, EngineError> {
        Self::new(definition, Map::new())
    }

    /// Conveniencia para tests y composición declarativa: `options` debe ser
    /// un objeto JSON.
    pub fn from_json<D: StepDefinition + 'static>(definition: D, options: Value) -> Result<Self, EngineError> {
        let label = definition.metadata().label;
        match options {
            Value::Object(map) => Self::new(Arc::new(definition), map),
            Value::Null => Self::new(Arc::new(definition), Map::new()),
            other => Err(EngineError::InvalidOptions { label,
                                                       message: format!("options must be an object, got {other}") }),
        }
    }

    /// Nueva instancia sin ejecutar del mismo tipo y opciones.
    pub fn fresh(&self) -> Result<Self, EngineError> {
        Self::new(Arc::clone(&self.definition), self.options.clone())
    }

    pub fn definition(&self) -> &Arc<dyn StepDefinition> {
        &self.definition
    }

    pub fn metadata(&self) -> &StepMetadata {
        &self.metadata
    }

    pub fn label(&self) -> &str {
        &self.metadata.label
    }

    pub fn label_dashed(&self) -> String {
        self.metadata.label.replace('_', "-")
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    pub fn kind(&self) -> StepKind {
        self.metadata.kind
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn param_values(&self) -> &ParamValues {
        &self.param_values
    }

    /// Hash estable de la identidad (tipo + opciones canónicas).
    pub fn fingerprint(&self) -> String {
        hash_value(&serde_json::json!({
            "kind": self.definition.kind_id(),
            "options": Value::Object(self.options.clone()),
        }))
    }

    pub fn associated_feature(&self, catalog: &dyn Catalog) -> Option<Feature> {
        self.metadata.for_feature.as_deref().and_then(|name| catalog.find_feature(name))
    }

    pub fn necessary(&self) -> bool {
        self.definition.necessary(&self.param_values)
    }

    /// Prerrequisitos propios, ya instanciados.
    pub fn preparation_steps(&self) -> Result<Vec<Executable>, EngineError> {
        self.definition
            .preparation_steps(&self.param_values)
            .into_iter()
            .map(StepRef::ensure_instance)
            .collect()
    }

    /// Next steps propuestos durante la última ejecución.
    pub fn next_steps(&self) -> &[StepRef] {
        &self.next_steps
    }

    pub fn executed(&self) -> bool {
        self.execution.is_some()
    }

    pub fn execution(&self) -> Result<&Execution, EngineError> {
        self.execution
            .as_ref()
            .ok_or_else(|| EngineError::ExecutionNotStarted(self.metadata.label.clone()))
    }

    pub(crate) fn execution_mut(&mut self) -> Result<&mut Execution, EngineError> {
        let label = &self.metadata.label;
        self.execution
            .as_mut()
            .ok_or_else(|| EngineError::ExecutionNotStarted(label.clone()))
    }

    pub fn status(&self) -> Option<ExecutionStatus> {
        self.execution.as_ref().map(Execution::status)
    }

    pub fn success(&self) -> bool {
        self.execution.as_ref().is_some_and(Execution::success)
    }

    pub fn fail(&self) -> bool {
        self.execution.as_ref().is_some_and(Execution::fail)
    }

    pub fn warning(&self) -> bool {
        self.execution.as_ref().is_some_and(Execution::warning)
    }

    pub fn whitelisted(&self) -> bool {
        self.execution.as_ref().is_some_and(Execution::whitelisted)
    }

    pub fn resolved(&self) -> bool {
        self.execution.as_ref().is_some_and(Execution::resolved)
    }

    pub fn output(&self) -> &[String] {
        self.execution.as_ref().map(Execution::output).unwrap_or_default()
    }

    /// Acepta explícitamente el resultado: sale del agregado por defecto sin
    /// cambiar su estado.
    pub fn whitelist(&mut self) -> Result<(), EngineError> {
        self.execution_mut()?.whitelisted = true;
        Ok(())
    }

    /// Adjunta `execution`, limpia los next steps previos y ejecuta `run`.
    ///
    /// Devuelve la señal cruda del step; traducirla al estado de la
    /// `Execution` queda a cargo del runner (`Execution::settle`).
    pub(crate) fn execute_once(&mut self,
                               execution: Execution,
                               reporter: &mut dyn Reporter,
                               assumeyes: bool)
                               -> Result<StepResult, EngineError> {
        if self.execution.is_some() {
            return Err(EngineError::AlreadyExecuted(self.metadata.label.clone()));
        }
        debug!("execute_once:start label={}", self.metadata.label);
        self.next_steps.clear();
        let definition = Arc::clone(&self.definition);
        let execution = self.execution.insert(execution);
        execution.start();
        reporter.before_execution_starts(execution);

        let mut ctx = StepContext { execution,
                                    reporter,
                                    params: &self.param_values,
                                    next_steps: &mut self.next_steps,
                                    assumeyes };
        let result = definition.run(&mut ctx);
        debug!("execute_once:done label={} result={:?}", self.metadata.label, result);
        Ok(result)
    }

    pub fn to_checkpoint(&self) -> CheckpointRecord {
        CheckpointRecord { label: self.metadata.label.clone(),
                           param_values: self.param_values.as_map().clone(),
                           status: self.execution.as_ref().map(Execution::status),
                           output: self.execution.as_ref().map(|e| e.output.clone()) }
    }

    pub fn matches_checkpoint(&self, record: &CheckpointRecord) -> bool {
        record.label == self.metadata.label && &record.param_values == self.param_values.as_map()
    }

    /// Reconstruye la ejecución guardada en `record`. No modifica la
    /// instancia si el registro no corresponde o si ya fue ejecutada.
    pub fn restore_from_checkpoint(&mut self, record: &CheckpointRecord) -> Result<(), EngineError> {
        if !self.matches_checkpoint(record) {
            return Err(EngineError::CheckpointMismatch { label: self.metadata.label.clone(),
                                                         reason: format!("record is for [{}] with {:?}",
                                                                         record.label, record.param_values) });
        }
        if self.execution.is_some() {
            return Err(EngineError::AlreadyExecuted(self.metadata.label.clone()));
        }
        let status = record.status.unwrap_or(ExecutionStatus::Pending);
        let output = record.output.clone().unwrap_or_default();
        self.execution = Some(Execution::stored(self.metadata.description.clone(), status, output));
        Ok(())
    }
}

impl PartialEq for Executable {
    fn eq(&self, other: &Self) -> bool {
        self.definition.kind_id() == other.definition.kind_id() && self.options == other.options
    }
}

impl Eq for Executable {}

impl Hash for Executable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.definition.kind_id().hash(state);
        to_canonical_json(&Value::Object(self.options.clone())).hash(state);
    }
}
