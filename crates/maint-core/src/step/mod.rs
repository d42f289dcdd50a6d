//! Definiciones relacionadas a Steps.
//!
//! Un step es una unidad de diagnóstico o remediación ejecutada contra el
//! host. Este módulo define:
//! - `StepDefinition`: comportamiento propio de cada tipo de step.
//! - `StepMetadata` / `StepKind`: metadata declarativa.
//! - `StepContext`: lo que un step puede hacer durante su `run`.
//! - `StepInterrupt` / `StepResult`: señales `fail`/`warn` como valores.
//! - `StepRef`: tipo o instancia configurada, normalizados con `ensure_instance`.

pub mod context;
pub mod definition;
mod signal;
mod step_ref;

pub use context::StepContext;
pub use definition::{StepDefinition, StepKind, StepMetadata};
pub use signal::{StepInterrupt, StepResult};
pub use step_ref::StepRef;
