//! Values stored in registry slots.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a registry variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// 64-bit float.
    #[default]
    Float,
    /// 64-bit signed integer.
    Int,
    /// Boolean flag.
    Bool,
    /// Free-form text.
    Text,
}

impl ValueKind {
    /// Value a freshly defined slot of this kind holds.
    #[must_use]
    pub fn zero(self) -> Value {
        match self {
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Int => Value::Int(0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Text => Value::Text(String::new()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Float => write!(f, "float"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Text => write!(f, "text"),
        }
    }
}

/// A value written to or read from a slot.
///
/// Converted telemetry fields arrive as [`Value::Float`]; passthrough fields
/// arrive as [`Value::Text`] and are coerced into the slot's kind on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Floating point value.
    Float(f64),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Text value.
    Text(String),
}

impl Value {
    /// The kind this value naturally belongs to.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            #[expect(
                clippy::cast_precision_loss,
                reason = "telemetry integers are far below 2^52"
            )]
            Value::Int(v) => Some(*v as f64),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Text(s) => parse_finite(s),
        }
    }

    /// Text view of the value, if it is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert the value into `kind`, returning `None` when it cannot be
    /// represented.
    ///
    /// Text is parsed the way the generic protocol sends it: surrounding
    /// whitespace is ignored and numbers may carry a fraction.
    #[must_use]
    pub fn coerce(&self, kind: ValueKind) -> Option<Value> {
        match (kind, self) {
            (ValueKind::Text, Value::Text(s)) => Some(Value::Text(s.clone())),
            (ValueKind::Text, other) => Some(Value::Text(other.to_string())),
            (ValueKind::Float, Value::Float(v)) => v.is_finite().then_some(Value::Float(*v)),
            (ValueKind::Float, other) => other.as_f64().map(Value::Float),
            (ValueKind::Int, Value::Int(v)) => Some(Value::Int(*v)),
            (ValueKind::Int, Value::Text(s)) => match s.trim().parse::<i64>() {
                Ok(v) => Some(Value::Int(v)),
                Err(_) => parse_finite(s).and_then(truncate_to_i64).map(Value::Int),
            },
            (ValueKind::Int, other) => other.as_f64().and_then(truncate_to_i64).map(Value::Int),
            (ValueKind::Bool, Value::Bool(v)) => Some(Value::Bool(*v)),
            (ValueKind::Bool, Value::Text(s)) => parse_bool(s).map(Value::Bool),
            (ValueKind::Bool, other) => other
                .as_f64()
                .map(|v| Value::Bool(v.abs() > f64::EPSILON)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn truncate_to_i64(value: f64) -> Option<i64> {
    // 2^63, exactly representable.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated.abs() >= LIMIT {
        return None;
    }
    #[expect(clippy::cast_possible_truncation, reason = "range checked above")]
    let out = truncated as i64;
    Some(out)
}

fn parse_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => parse_finite(trimmed).map(|v| v.abs() > f64::EPSILON),
    }
}
