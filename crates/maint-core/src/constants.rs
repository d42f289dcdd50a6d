//! Constantes del motor.

/// Versión del formato de checkpoint. Se guarda en cada `ScenarioCheckpoint`
/// y se compara al restaurar: un cambio incompatible del formato debe
/// incrementarla.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Descripción fija de los escenarios de preparación.
pub const PREPARATION_DESCRIPTION: &str = "preparation steps required to run the next scenarios";

/// Prefijo de variables de entorno leídas por `RunnerConfig::from_env`.
pub const ENV_PREFIX: &str = "MAINTFLOW_";
