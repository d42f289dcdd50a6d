//! Estado de resultado de una ejecución de un step.
//!
//! Cada `Execution` pertenece a un único `Executable`. Se crea nueva al
//! empezar una ejecución o se reconstruye desde un checkpoint
//! (`restored = true`); una vez terminada queda congelada salvo por los
//! flags de aceptación (`whitelisted`, `resolved`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::step::{StepInterrupt, StepResult};

/// Estado de un step en tiempo de ejecución.
///
/// Transiciones válidas:
/// - `Pending` -> `Running`
/// - `Running` -> `Success` | `Fail` | `Warning`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Success,
    Fail,
    Warning,
}

impl ExecutionStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Fail | Self::Warning)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Descripción del step ejecutado (lo que muestra el reporter).
    pub name: String,
    pub(crate) status: ExecutionStatus,
    pub(crate) output: Vec<String>,
    pub(crate) whitelisted: bool,
    pub(crate) resolved: bool,
    pub(crate) restored: bool,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
}

impl Execution {
    pub fn new(name: impl Into<String>, whitelisted: bool) -> Self {
        Self { name: name.into(),
               status: ExecutionStatus::Pending,
               output: Vec::new(),
               whitelisted,
               resolved: false,
               restored: false,
               started_at: None,
               finished_at: None }
    }

    /// Ejecución ya terminada reconstruida desde un checkpoint.
    pub(crate) fn stored(name: impl Into<String>, status: ExecutionStatus, output: Vec<String>) -> Self {
        Self { status,
               output,
               restored: true,
               ..Self::new(name, false) }
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    pub fn fail(&self) -> bool {
        self.status == ExecutionStatus::Fail
    }

    pub fn warning(&self) -> bool {
        self.status == ExecutionStatus::Warning
    }

    pub fn whitelisted(&self) -> bool {
        self.whitelisted
    }

    /// El fallo fue atendido por un next step exitoso.
    pub fn resolved(&self) -> bool {
        self.resolved
    }

    pub fn restored(&self) -> bool {
        self.restored
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub(crate) fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn set_fail(&mut self, message: impl Into<String>) {
        self.status = ExecutionStatus::Fail;
        self.output.push(message.into());
    }

    pub(crate) fn set_warn(&mut self, message: impl Into<String>) {
        self.status = ExecutionStatus::Warning;
        self.output.push(message.into());
    }

    /// Traduce el resultado de `run` al estado final. Sólo se pasa a
    /// `Success` si el step no dejó ya un fail/warning con `set_fail`.
    pub(crate) fn settle(&mut self, result: &StepResult) {
        match result {
            Ok(()) => {
                if self.status == ExecutionStatus::Running {
                    self.status = ExecutionStatus::Success;
                }
            }
            Err(StepInterrupt::Fail(message)) | Err(StepInterrupt::Fault(message)) => self.set_fail(message.clone()),
            Err(StepInterrupt::Warn(message)) => self.set_warn(message.clone()),
        }
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_keeps_partial_problem_recorded_with_set_fail() {
        let mut e = Execution::new("check disk", false);
        e.start();
        e.set_warn("90% used");
        e.settle(&Ok(()));
        assert_eq!(e.status(), ExecutionStatus::Warning);
        assert_eq!(e.output(), ["90% used"]);
    }

    #[test]
    fn settle_maps_interrupts() {
        let mut e = Execution::new("check disk", false);
        e.start();
        e.settle(&Err(StepInterrupt::Fail("no space".into())));
        assert!(e.fail());
        assert!(e.finished_at().is_some());

        let mut e = Execution::new("check disk", false);
        e.start();
        e.settle(&Ok(()));
        assert!(e.success());
    }
}
