use std::{cmp::Ordering, fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::error::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Integer,
    Real,
    Text,
    Blob,
    /// Fixed-point number, e.g. `DECIMAL(5, 2)`.
    Decimal { precision: u32, scale: u32 },
}

impl DataType {
    pub fn sql_name(&self) -> String {
        match self {
            DataType::Null => "NULL".to_string(),
            DataType::Integer => "INTEGER".to_string(),
            DataType::Real => "REAL".to_string(),
            DataType::Text => "TEXT".to_string(),
            DataType::Blob => "BLOB".to_string(),
            DataType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_name())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Decimal(Decimal),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::Text(_) => DataType::Text,
            Value::Blob(_) => DataType::Blob,
            Value::Decimal(d) => DataType::Decimal {
                precision: 28,
                scale: d.scale(),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the value as a fixed-point number rounded half away from zero
    /// to `scale` places.
    ///
    /// Storage engines hand back DECIMAL columns as integers, reals or text
    /// depending on their affinity rules, so all three are accepted.
    pub fn to_decimal(&self, scale: u32) -> Result<Decimal, DatabaseError> {
        let decimal = match self {
            Value::Decimal(d) => *d,
            Value::Integer(i) => Decimal::from(*i),
            Value::Real(r) => {
                Decimal::from_f64_retain(*r).ok_or_else(|| DatabaseError::TypeMismatch {
                    expected: "finite decimal".to_string(),
                    actual: r.to_string(),
                })?
            }
            Value::Text(s) => {
                Decimal::from_str(s.trim()).map_err(|_| DatabaseError::TypeMismatch {
                    expected: "decimal".to_string(),
                    actual: format!("'{}'", s),
                })?
            }
            other => {
                return Err(DatabaseError::TypeMismatch {
                    expected: "decimal".to_string(),
                    actual: other.data_type().to_string(),
                });
            }
        };
        Ok(decimal.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn is_compatible_with_type(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true,
            (Value::Integer(_), DataType::Integer | DataType::Real | DataType::Decimal { .. }) => true,
            (Value::Real(_), DataType::Real | DataType::Decimal { .. }) => true,
            (Value::Decimal(_), DataType::Decimal { .. } | DataType::Real) => true,
            (Value::Text(_), DataType::Text) => true,
            (Value::Blob(_), DataType::Blob) => true,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
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

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Decimal(d) => write!(f, "{}", d),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Real(b)) => (*a as f64).partial_cmp(b),
            (Value::Real(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::Decimal(a), Value::Integer(b)) => a.partial_cmp(&Decimal::from(*b)),
            (Value::Integer(a), Value::Decimal(b)) => Decimal::from(*a).partial_cmp(b),
            (Value::Decimal(a), Value::Real(b)) => {
                Decimal::from_f64_retain(*b).and_then(|b| a.partial_cmp(&b))
            }
            (Value::Real(a), Value::Decimal(b)) => {
                Decimal::from_f64_retain(*a).and_then(|a| a.partial_cmp(b))
            }
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Blob(a), Value::Blob(b)) => a.partial_cmp(b),
            _ => None, // Mixed types
        }
    }
}
