//! Configuración del runner desde variables de entorno.
//! `MAINTFLOW_ASSUMEYES` (`1|true|yes`) y `MAINTFLOW_WHITELIST` (labels
//! separados por coma).

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::constants::ENV_PREFIX;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Responde "sí" a toda pregunta del runner y de los reporters.
    pub assumeyes: bool,
    /// Labels cuyas ejecuciones nacen aceptadas, en forma con guiones.
    pub whitelist: Vec<String>,
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero leyendo de `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let assumeyes = lookup(&format!("{ENV_PREFIX}ASSUMEYES")).map(|v| matches!(v.trim().to_ascii_lowercase().as_str(),
                                                                                 "1" | "true" | "yes"))
                                                                 .unwrap_or(false);
        let whitelist: Vec<String> = lookup(&format!("{ENV_PREFIX}WHITELIST")).map(|v| {
                                                                     v.split(',')
                                                                      .map(str::trim)
                                                                      .filter(|l| !l.is_empty())
                                                                      .map(String::from)
                                                                      .collect()
                                                                 })
                                                                 .unwrap_or_default();
        Self::default().with_assumeyes(assumeyes).with_whitelist(whitelist)
    }

    pub fn with_assumeyes(mut self, assumeyes: bool) -> Self {
        self.assumeyes = assumeyes;
        self
    }

    pub fn with_whitelist<I, T>(mut self, labels: I) -> Self
        where I: IntoIterator<Item = T>,
              T: AsRef<str>
    {
        self.whitelist = labels.into_iter().map(|l| l.as_ref().replace('_', "-")).collect();
        self
    }

    /// `label_dashed` es el label del step con guiones.
    pub fn is_whitelisted(&self, label_dashed: &str) -> bool {
        self.whitelist.iter().any(|l| l == label_dashed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_flags_and_whitelist() {
        let cfg = RunnerConfig::from_lookup(lookup(&[("MAINTFLOW_ASSUMEYES", "Yes"),
                                                     ("MAINTFLOW_WHITELIST", "disk_io, db-up,,")]));
        assert!(cfg.assumeyes);
        assert_eq!(cfg.whitelist, vec!["disk-io", "db-up"]);
        assert!(cfg.is_whitelisted("disk-io"));
        assert!(!cfg.is_whitelisted("disk_io"));
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(RunnerConfig::from_lookup(lookup(&[("MAINTFLOW_ASSUMEYES", "0")])), RunnerConfig::default());
    }
}
