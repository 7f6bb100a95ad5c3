use serde::{Deserialize, Serialize};

use crate::types::{error::DatabaseError, value::Value};

/// One result row as handed back by a cursor, values in select-list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    /// Like `get_value`, but a missing column is an error.
    pub fn value(&self, column_index: usize) -> Result<&Value, DatabaseError> {
        self.values
            .get(column_index)
            .ok_or(DatabaseError::ColumnIndexOutOfBounds {
                index: column_index,
            })
    }

    pub fn set_value(&mut self, column_index: usize, value: Value) -> Result<(), DatabaseError> {
        if column_index >= self.values.len() {
            return Err(DatabaseError::ColumnIndexOutOfBounds {
                index: column_index,
            });
        }
        self.values[column_index] = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Takes ownership of the value at `column_index`, leaving `Null` behind.
    pub fn take_value(&mut self, column_index: usize) -> Result<Value, DatabaseError> {
        self.values
            .get_mut(column_index)
            .map(std::mem::take)
            .ok_or(DatabaseError::ColumnIndexOutOfBounds {
                index: column_index,
            })
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
