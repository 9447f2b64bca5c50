use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::types::error::{DatabaseError, Result};

/// Column type. The discriminants are the type tags stored in table descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Text = 0,
    Float = 1,
    Int = 2,
    Bool = 3,
}

impl ValueType {
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(ValueType::Text),
            1 => Ok(ValueType::Float),
            2 => Ok(ValueType::Int),
            3 => Ok(ValueType::Bool),
            _ => Err(DatabaseError::UnsupportedValueType(tag)),
        }
    }

    pub fn as_tag(&self) -> u8 {
        *self as u8
    }

    /// Encoded width in bytes, `None` for length-prefixed text.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            ValueType::Int | ValueType::Float => Some(4),
            ValueType::Bool => Some(1),
            ValueType::Text => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Text => "text",
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
        };
        f.write_str(name)
    }
}

impl FromStr for ValueType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "str" | "string" => Ok(ValueType::Text),
            "float" | "real" => Ok(ValueType::Float),
            "int" | "integer" => Ok(ValueType::Int),
            "bool" | "boolean" => Ok(ValueType::Bool),
            other => Err(DatabaseError::InvalidSchema {
                reason: format!("unknown column type '{}'", other),
            }),
        }
    }
}

/// A single column value.
///
/// Values carry a total order (type rank first, then the natural order of the
/// payload, floats by `total_cmp` with `-0.0` folded onto `0.0`) so key tuples
/// can be kept in ordered indexes.
/// Predicate evaluation uses the looser [`Value::compare`] and
/// [`Value::loose_eq`], which compare ints and floats numerically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::Text(_) => ValueType::Text,
        }
    }

    pub fn serialized_size(&self) -> usize {
        match self {
            Value::Int(_) | Value::Float(_) => 4,
            Value::Bool(_) => 1,
            Value::Text(s) => 4 + s.len(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts the value to `target` when that loses nothing (same type, or int to float).
    pub fn coerce_to(self, target: ValueType) -> Option<Value> {
        match (self, target) {
            (Value::Int(i), ValueType::Float) => Some(Value::Float(i as f32)),
            (value, target) if value.value_type() == target => Some(value),
            _ => None,
        }
    }

    /// Converts an equality literal to the `target` key value it is
    /// [`Value::loose_eq`] to. Integral floats become ints; `None` when no
    /// value of `target` can match.
    pub fn key_literal(self, target: ValueType) -> Option<Value> {
        match (self, target) {
            (Value::Float(x), ValueType::Int)
                if x.fract() == 0.0 && x >= i32::MIN as f32 && x < -(i32::MIN as f32) =>
            {
                Some(Value::Int(x as i32))
            }
            (value, target) => value.coerce_to(target),
        }
    }

    /// Ordering used by `less`/`greater`; `None` for incomparable types.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Int(b)) => (*a as f64).partial_cmp(&(*b as f64)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Equality used by `equals`; values of unrelated types are never equal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Text(_) => 3,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => (a + 0.0).total_cmp(&(b + 0.0)),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
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
