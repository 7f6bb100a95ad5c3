use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AGE_SCALE, error::DatabaseError, row::Row, value::Value};

/// A row of `user_data`, decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub age: Decimal,
}

impl UserRecord {
    pub const COLUMN_COUNT: usize = 4;

    /// Decodes a `(user_id, name, email, age)` row.
    pub fn from_row(mut row: Row) -> Result<Self, DatabaseError> {
        if row.len() != Self::COLUMN_COUNT {
            return Err(DatabaseError::InvalidData {
                details: format!(
                    "user_data row has {} values, expected {}",
                    row.len(),
                    Self::COLUMN_COUNT
                ),
            });
        }
        let age = row.value(3)?.to_decimal(AGE_SCALE)?;
        Ok(Self {
            user_id: take_text(&mut row, 0, "user_id")?,
            name: take_text(&mut row, 1, "name")?,
            email: take_text(&mut row, 2, "email")?,
            age,
        })
    }

    pub fn into_row(self) -> Row {
        Row::new(vec![
            Value::Text(self.user_id),
            Value::Text(self.name),
            Value::Text(self.email),
            Value::Decimal(self.age),
        ])
    }
}

impl TryFrom<Row> for UserRecord {
    type Error = DatabaseError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Self::from_row(row)
    }
}

/// Decodes a single-column `age` projection.
pub fn decode_age(row: Row) -> Result<Decimal, DatabaseError> {
    row.value(0)?.to_decimal(AGE_SCALE)
}

fn take_text(row: &mut Row, index: usize, column: &str) -> Result<String, DatabaseError> {
    match row.take_value(index)? {
        Value::Text(text) => Ok(text),
        other => Err(DatabaseError::TypeMismatch {
            expected: format!("TEXT for column '{}'", column),
            actual: other.data_type().to_string(),
        }),
    }
}
