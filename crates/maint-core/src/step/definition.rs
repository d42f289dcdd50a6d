use std::fmt::Debug;

use crate::param::{Param, ParamValues};

use super::{StepContext, StepRef, StepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Verifica el estado del host. Tras un fix exitoso se vuelve a ejecutar.
    Check,
    /// Modifica el host.
    Procedure,
}

/// Metadata declarativa de un tipo de step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMetadata {
    pub label: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Feature del catálogo a la que está ligado el step.
    pub for_feature: Option<String>,
    pub kind: StepKind,
}

impl StepMetadata {
    pub fn check(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self { label: label.into(),
               description: description.into(),
               tags: Vec::new(),
               for_feature: None,
               kind: StepKind::Check }
    }

    pub fn procedure(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self { kind: StepKind::Procedure,
               ..Self::check(label, description) }
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
        where I: IntoIterator<Item = T>,
              T: Into<String>
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn for_feature(mut self, feature: impl Into<String>) -> Self {
        self.for_feature = Some(feature.into());
        self
    }
}

/// Trait que define un tipo de step. Las implementaciones no guardan estado
/// de ejecución: los parámetros llegan ya procesados en `ParamValues` y el
/// resultado se registra a través del `StepContext`.
pub trait StepDefinition: Debug + Send + Sync {
    fn metadata(&self) -> StepMetadata;

    /// Descriptores de parámetros aceptados. Cualquier otra opción es inválida.
    fn params(&self) -> Vec<Param> {
        Vec::new()
    }

    /// `false` si el step puede omitirse (p.ej. el paquete ya está instalado).
    /// Sin efectos secundarios: se consulta varias veces.
    fn necessary(&self, _params: &ParamValues) -> bool {
        true
    }

    /// Prerrequisitos que deben correr (si siguen siendo necesarios) antes del
    /// escenario que contiene este step.
    fn preparation_steps(&self, _params: &ParamValues) -> Vec<StepRef> {
        Vec::new()
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> StepResult;

    /// Identidad del tipo concreto; entra en la igualdad de `Executable`.
    fn kind_id(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
