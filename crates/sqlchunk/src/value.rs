//! Bind values, rows and small request helper types.

use serde::Deserialize;

pub use serde_json::Value;

/// A result row: column name → value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// Field → value mapping used by WHERE specs and write requests (insertion ordered).
pub type FieldMap = serde_json::Map<String, Value>;

/// Parameters handed to the pooled client.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// `?`-style ordered binding.
    Positional(Vec<Value>),
    /// `:name`-style binding resolved against a mapping.
    Named(FieldMap),
}

impl Params {
    /// No parameters.
    pub fn none() -> Self {
        Self::Positional(Vec::new())
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        match self {
            Self::Positional(v) => v.len(),
            Self::Named(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<FieldMap> for Params {
    fn from(values: FieldMap) -> Self {
        Self::Named(values)
    }
}

impl From<Value> for Params {
    /// Objects become named parameters; anything else is normalized to a positional list.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Named(map),
            other => Self::Positional(normalize_params(other)),
        }
    }
}

/// Normalize an explicit parameter value to a list.
///
/// Arrays are flattened one level, `null` becomes an empty list and any other
/// scalar becomes a one-element list.
pub fn normalize_params(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Accept either a single value or a list of values in request payloads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(v) => v,
        }
    }
}

/// Read an integer id from a row value (numbers or integer-valued strings).
pub(crate) fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
