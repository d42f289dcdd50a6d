//! Parámetros declarados por cada tipo de step.
//!
//! Un `Param` es un descriptor estático (nombre, tipo, default, conversor).
//! Al construir un `Executable` cada descriptor procesa el valor crudo de
//! las opciones y el resultado se fija una única vez en `ParamValues`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::EngineError;

/// Conversor/validador adicional aplicado tras la coerción por tipo.
pub type ParamConverter = fn(Value) -> Result<Value, String>;

/// Tipo esperado de un parámetro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    /// Flag: ausente equivale a `false`.
    Bool,
    Integer,
    /// Lista; acepta también un string separado por comas.
    Array,
    Any,
}

/// Descriptor de un parámetro.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
    pub converter: Option<ParamConverter>,
}

impl Param {
    pub fn new(name: &'static str, kind: ParamKind) -> Self {
        Self { name,
               description: "",
               kind,
               required: false,
               default: None,
               converter: None }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, ParamKind::String)
    }

    pub fn flag(name: &'static str) -> Self {
        Self::new(name, ParamKind::Bool)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, ParamKind::Integer)
    }

    pub fn array(name: &'static str) -> Self {
        Self::new(name, ParamKind::Array)
    }

    pub fn any(name: &'static str) -> Self {
        Self::new(name, ParamKind::Any)
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn convert_with(mut self, converter: ParamConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Procesa el valor crudo: default -> required -> coerción -> conversor.
    ///
    /// `label` sólo se usa para construir el error.
    pub fn process(&self, label: &str, raw: Option<&Value>) -> Result<Value, EngineError> {
        let invalid = |message: String| EngineError::InvalidOptions { label: label.to_string(),
                                                                      message };
        let value = match raw.filter(|v| !v.is_null()).or(self.default.as_ref()) {
            Some(v) => v.clone(),
            None if self.required => return Err(invalid(format!("param `{}` is required", self.name))),
            None if self.kind == ParamKind::Bool => Value::Bool(false),
            None => return Ok(Value::Null),
        };
        let value = self.coerce(value).map_err(|m| invalid(format!("param `{}`: {m}", self.name)))?;
        match self.converter {
            Some(convert) => convert(value).map_err(|m| invalid(format!("param `{}`: {m}", self.name))),
            None => Ok(value),
        }
    }

    fn coerce(&self, value: Value) -> Result<Value, String> {
        match (self.kind, value) {
            (ParamKind::Any, v) => Ok(v),
            (ParamKind::String, Value::String(s)) => Ok(Value::String(s)),
            (ParamKind::String, v @ (Value::Number(_) | Value::Bool(_))) => Ok(Value::String(v.to_string())),
            (ParamKind::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (ParamKind::Bool, Value::String(s)) => match s.as_str() {
                "true" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "0" => Ok(Value::Bool(false)),
                other => Err(format!("expected a boolean, got `{other}`")),
            },
            (ParamKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
            (ParamKind::Integer, Value::String(s)) => s.trim()
                                                       .parse::<i64>()
                                                       .map(Value::from)
                                                       .map_err(|_| format!("expected an integer, got `{s}`")),
            (ParamKind::Array, Value::Array(items)) => Ok(Value::Array(items)),
            (ParamKind::Array, Value::String(s)) => Ok(Value::Array(s.split(',')
                                                                      .map(str::trim)
                                                                      .filter(|p| !p.is_empty())
                                                                      .map(|p| Value::String(p.to_string()))
                                                                      .collect())),
            (kind, other) => Err(format!("expected {kind:?}, got {other}")),
        }
    }
}

/// Valores ya procesados, uno por parámetro declarado.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues {
    values: BTreeMap<String, Value>,
}

impl ParamValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fija el valor de `name`. Fijarlo dos veces es un defecto del llamador.
    pub fn bind(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        if self.values.contains_key(name) {
            return Err(EngineError::ParamAlreadyBound(name.to_string()));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Decodifica el valor de `name` a un tipo concreto.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, EngineError> {
        let value = self.values.get(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| EngineError::Serialization(format!("param `{name}`: {e}")))
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for ParamValues {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn positive(v: Value) -> Result<Value, String> {
        match v.as_i64() {
            Some(n) if n > 0 => Ok(v),
            _ => Err("must be positive".into()),
        }
    }

    #[test]
    fn defaults_and_flags() {
        let p = Param::string("service").default_value(json!("httpd"));
        assert_eq!(p.process("svc", None).unwrap(), json!("httpd"));
        assert_eq!(Param::flag("force").process("svc", None).unwrap(), json!(false));
        assert_eq!(Param::string("opt").process("svc", None).unwrap(), Value::Null);
    }

    #[test]
    fn required_param_missing_is_invalid_options() {
        let err = Param::string("packages").required().process("install", None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidOptions { ref label, .. } if label == "install"));
        assert!(err.to_string().contains("param `packages` is required"));
    }

    #[test]
    fn coercion_from_strings() {
        assert_eq!(Param::flag("f").process("x", Some(&json!("yes"))).unwrap(), json!(true));
        assert_eq!(Param::integer("n").process("x", Some(&json!(" 42 "))).unwrap(), json!(42));
        assert_eq!(Param::array("pkgs").process("x", Some(&json!("a, b,,c"))).unwrap(),
                   json!(["a", "b", "c"]));
        assert!(Param::integer("n").process("x", Some(&json!("many"))).is_err());
        assert!(Param::flag("f").process("x", Some(&json!(3))).is_err());
    }

    #[test]
    fn converter_runs_after_coercion() {
        let p = Param::integer("count").convert_with(positive);
        assert_eq!(p.process("x", Some(&json!("5"))).unwrap(), json!(5));
        let err = p.process("x", Some(&json!(-1))).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn bind_twice_is_rejected() {
        let mut values = ParamValues::new();
        values.bind("service", json!("httpd")).unwrap();
        assert_eq!(values.bind("service", json!("nginx")),
                   Err(EngineError::ParamAlreadyBound("service".into())));
        assert_eq!(values.get_str("service"), Some("httpd"));
        let s: String = values.get_as("service").unwrap();
        assert_eq!(s, "httpd");
    }
}
