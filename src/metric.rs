use std::fmt;

use serde_json::{Number, Value};

/// A single value from the colibri statistics document.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(Number),
    Bool(bool),
}

impl MetricValue {
    /// Numeric view used for threshold evaluation. Booleans count as `1`/`0`.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Number(n) => n.as_f64().unwrap_or_default(),
            MetricValue::Bool(b) => u8::from(*b).into(),
        }
    }

    /// Converts a JSON value, returning `None` for anything that is neither a number nor a bool.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(MetricValue::Number(n.clone())),
            Value::Bool(b) => Some(MetricValue::Bool(*b)),
            _ => None,
        }
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        MetricValue::Number(Number::from(0))
    }
}

impl From<i32> for MetricValue {
    fn from(value: i32) -> Self {
        MetricValue::Number(Number::from(value))
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Number(Number::from(value))
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Bool(value)
    }
}

// Performance data wants integers for booleans, so `true` renders as `1`.
impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::Bool(b) => write!(f, "{}", u8::from(*b)),
        }
    }
}
