//! Canonicalización JSON y hashing de identidades.
//!
//! Las opciones de un step y los checkpoints se identifican por el hash
//! blake3 de su JSON canónico (claves ordenadas), de modo que dos mapas con
//! igual contenido producen el mismo hash sin importar el orden de inserción.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_str, hash_value};
