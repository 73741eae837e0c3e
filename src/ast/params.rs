//! Runtime parameter values
//!
//! The caller supplies one [`ParameterValues`] map per generation call. The
//! generator only reads it: values matter when they decide the *shape* of the
//! SQL (null comparisons, `IN` list expansion, raw SQL arguments). Everything
//! else is bound by name at execution time, outside this crate.

use super::types::ValueKind;
use std::collections::HashMap;

/// A runtime value: a bound parameter or an inline constant
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Collection of values (for `IN` lists and raw SQL argument arrays)
    Array(Vec<Value>),
    /// JSON document (stored as serde_json::Value)
    Json(serde_json::Value),
}

impl Value {
    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Kind used to look up a type mapping. Null and arrays have none.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Null | Self::Array(_) => None,
            Self::Bool(_) => Some(ValueKind::Bool),
            Self::Integer(_) => Some(ValueKind::Integer),
            Self::Float(_) => Some(ValueKind::Float),
            Self::String(_) => Some(ValueKind::String),
            Self::Bytes(_) => Some(ValueKind::Bytes),
            Self::Json(_) => Some(ValueKind::Json),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Immutable, name-keyed map of parameter values for one generation call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValues {
    values: HashMap<String, Value>,
}

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, consuming the map
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Build a map from a JSON object; other JSON values give an empty map
    pub fn from_json(json: &serde_json::Value) -> Self {
        let values = match json {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(name, value)| (name.clone(), json_to_value(value)))
                .collect(),
            _ => HashMap::new(),
        };
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Convert a serde_json::Value to a Value
pub fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                // Fallback to string representation
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(arr) => Value::Array(arr.iter().map(json_to_value).collect()),
        serde_json::Value::Object(_) => {
            // Store objects as JSON
            Value::Json(value.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameter_values() {
        let params = ParameterValues::new()
            .with("id", 42)
            .with("name", "Alice")
            .with("missing", None::<i32>);

        assert_eq!(params.len(), 3);
        assert_eq!(params.get("id"), Some(&Value::Integer(42)));
        assert!(params.get("missing").unwrap().is_null());
        assert!(!params.contains("other"));
    }

    #[test]
    fn test_from_json() {
        let params = ParameterValues::from_json(&json!({
            "ids": [1, 2, null],
            "city": "London",
            "filter": {"a": 1}
        }));

        match params.get("ids") {
            Some(Value::Array(v)) => {
                assert_eq!(v.len(), 3);
                assert!(v[2].is_null());
            }
            other => panic!("Expected Array, got {:?}", other),
        }
        assert_eq!(params.get("city"), Some(&Value::from("London")));
        assert!(matches!(params.get("filter"), Some(Value::Json(_))));

        assert!(ParameterValues::from_json(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_json_to_value() {
        assert!(matches!(json_to_value(&json!(true)), Value::Bool(true)));
        assert!(matches!(json_to_value(&json!(42)), Value::Integer(42)));
        assert!(matches!(json_to_value(&json!(1.5)), Value::Float(f) if f == 1.5));
        assert!(matches!(
            json_to_value(&json!("hello")),
            Value::String(s) if s == "hello"
        ));
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Integer(1).kind(), Some(ValueKind::Integer));
        assert_eq!(Value::from("x").kind(), Some(ValueKind::String));
        assert_eq!(Value::Null.kind(), None);
        assert_eq!(Value::from(vec![1, 2]).kind(), None);
    }
}
