//! maintflow
//!
//! Punto de entrada de la librería: re-exporta el motor de `maint-core`
//! para que clientes y el binario de demo usen una sola ruta.

pub use maint_core::*;
