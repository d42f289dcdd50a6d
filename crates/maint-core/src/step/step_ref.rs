use std::sync::Arc;

use crate::errors::EngineError;
use crate::executable::Executable;

use super::StepDefinition;

/// Referencia a un step dentro de una lista: un tipo (se instancia con
/// opciones por defecto) o una instancia ya configurada.
#[derive(Debug, Clone)]
pub enum StepRef {
    Kind(Arc<dyn StepDefinition>),
    Instance(Box<Executable>),
}

impl StepRef {
    pub fn kind<D: StepDefinition + 'static>(definition: D) -> Self {
        Self::Kind(Arc::new(definition))
    }

    pub fn ensure_instance(self) -> Result<Executable, EngineError> {
        match self {
            Self::Kind(definition) => Executable::with_defaults(definition),
            Self::Instance(executable) => Ok(*executable),
        }
    }
}

impl From<Executable> for StepRef {
    fn from(executable: Executable) -> Self {
        Self::Instance(Box::new(executable))
    }
}

impl From<Arc<dyn StepDefinition>> for StepRef {
    fn from(definition: Arc<dyn StepDefinition>) -> Self {
        Self::Kind(definition)
    }
}
