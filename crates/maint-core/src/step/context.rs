//! Contexto entregado a `StepDefinition::run`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::EngineError;
use crate::execution::Execution;
use crate::param::ParamValues;
use crate::reporter::Reporter;

use super::StepRef;

pub struct StepContext<'a> {
    pub(crate) execution: &'a mut Execution,
    pub(crate) reporter: &'a mut dyn Reporter,
    pub(crate) params: &'a ParamValues,
    pub(crate) next_steps: &'a mut Vec<StepRef>,
    pub(crate) assumeyes: bool,
}

impl<'a> StepContext<'a> {
    pub fn params(&self) -> &ParamValues {
        self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn param_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, EngineError> {
        self.params.get_as(name)
    }

    /// Progreso: se acumula en el output y se notifica al reporter.
    pub fn say(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.reporter.on_execution_update(&*self.execution, &message);
        self.execution.output.push(message);
    }

    /// Marca el step como fallido sin interrumpir su ejecución.
    pub fn set_fail(&mut self, message: impl Into<String>) {
        self.execution.set_fail(message);
    }

    /// Marca el step como warning sin interrumpir su ejecución.
    pub fn set_warn(&mut self, message: impl Into<String>) {
        self.execution.set_warn(message);
    }

    /// Propone un next step al operador si este step termina con problemas.
    pub fn add_next_step(&mut self, step: impl Into<StepRef>) {
        self.next_steps.push(step.into());
    }

    pub fn execution(&self) -> &Execution {
        &*self.execution
    }

    pub fn assumeyes(&self) -> bool {
        self.assumeyes
    }

    pub fn puts(&mut self, message: &str) {
        self.reporter.puts(message);
    }

    pub fn print(&mut self, message: &str) {
        self.reporter.print(message);
    }

    pub fn ask(&mut self, message: &str) -> String {
        self.reporter.ask(message)
    }
}
