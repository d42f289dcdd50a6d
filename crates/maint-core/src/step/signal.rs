/// Interrupción de un step. `Fail` y `Warn` son parte del vocabulario
/// esperado y se resuelven en la frontera del step; `Fault` es un fallo
/// inesperado y aborta el escenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInterrupt {
    Fail(String),
    Warn(String),
    Fault(String),
}

impl StepInterrupt {
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::Warn(message.into())
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }
}

/// Resultado de `StepDefinition::run`.
pub type StepResult = Result<(), StepInterrupt>;
