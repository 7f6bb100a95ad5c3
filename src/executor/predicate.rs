use std::cmp::Ordering;

use crate::{
    storage::schema::TableSchema,
    types::{error::DatabaseError, row::Row, value::Value},
};

/// Comparison operators for predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    IsNull,
    IsNotNull,
}

/// Logical operators for combining predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// A row filter evaluated client-side, e.g. over batches as they stream in.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Column comparison: column_name op value
    Comparison {
        column_name: String,
        op: ComparisonOp,
        value: Value,
    },
    /// Logical combination of predicates
    Logical {
        op: LogicalOp,
        left: Box<Predicate>,
        right: Option<Box<Predicate>>, // None for NOT operator
    },
    /// Always true predicate
    True,
    /// Always false predicate
    False,
}

impl Predicate {
    fn comparison(column_name: &str, op: ComparisonOp, value: Value) -> Self {
        Self::Comparison {
            column_name: column_name.to_string(),
            op,
            value,
        }
    }

    pub fn eq(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::Equal, value.into())
    }

    pub fn ne(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::NotEqual, value.into())
    }

    pub fn lt(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::LessThan, value.into())
    }

    pub fn le(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::LessThanOrEqual, value.into())
    }

    pub fn gt(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::GreaterThan, value.into())
    }

    pub fn ge(column_name: &str, value: impl Into<Value>) -> Self {
        Self::comparison(column_name, ComparisonOp::GreaterThanOrEqual, value.into())
    }

    pub fn is_null(column_name: &str) -> Self {
        Self::comparison(column_name, ComparisonOp::IsNull, Value::Null)
    }

    pub fn is_not_null(column_name: &str) -> Self {
        Self::comparison(column_name, ComparisonOp::IsNotNull, Value::Null)
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Self::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Some(Box::new(right)),
        }
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Self::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Some(Box::new(right)),
        }
    }

    pub fn not(predicate: Predicate) -> Self {
        Self::Logical {
            op: LogicalOp::Not,
            left: Box::new(predicate),
            right: None,
        }
    }

    /// Evaluate the predicate against a row using the table schema
    pub fn evaluate(&self, row: &Row, schema: &TableSchema) -> Result<bool, DatabaseError> {
        match self {
            Predicate::Comparison {
                column_name,
                op,
                value,
            } => {
                let column_index = schema.get_column_index(column_name).ok_or_else(|| {
                    DatabaseError::ColumnNotFound {
                        name: column_name.clone(),
                        table: schema.table_name.clone(),
                    }
                })?;
                let row_value = row.value(column_index)?;
                Ok(compare_values(row_value, *op, value))
            }
            Predicate::Logical { op, left, right } => match op {
                LogicalOp::And => {
                    if !left.evaluate(row, schema)? {
                        return Ok(false); // Short-circuit evaluation
                    }
                    binary_operand(right, "AND")?.evaluate(row, schema)
                }
                LogicalOp::Or => {
                    if left.evaluate(row, schema)? {
                        return Ok(true); // Short-circuit evaluation
                    }
                    binary_operand(right, "OR")?.evaluate(row, schema)
                }
                LogicalOp::Not => Ok(!left.evaluate(row, schema)?),
            },
            Predicate::True => Ok(true),
            Predicate::False => Ok(false),
        }
    }
}

fn binary_operand<'a>(
    right: &'a Option<Box<Predicate>>,
    op: &str,
) -> Result<&'a Predicate, DatabaseError> {
    right.as_deref().ok_or_else(|| DatabaseError::InvalidData {
        details: format!("{} operator requires two operands", op),
    })
}

/// NULL never compares equal or ordered, and mixed types are incomparable.
fn compare_values(left: &Value, op: ComparisonOp, right: &Value) -> bool {
    let ordering = || {
        if left.is_null() || right.is_null() {
            None
        } else {
            left.partial_cmp(right)
        }
    };
    match op {
        ComparisonOp::Equal => ordering() == Some(Ordering::Equal),
        ComparisonOp::NotEqual => matches!(ordering(), Some(Ordering::Less | Ordering::Greater)),
        ComparisonOp::LessThan => ordering() == Some(Ordering::Less),
        ComparisonOp::LessThanOrEqual => {
            matches!(ordering(), Some(Ordering::Less | Ordering::Equal))
        }
        ComparisonOp::GreaterThan => ordering() == Some(Ordering::Greater),
        ComparisonOp::GreaterThanOrEqual => {
            matches!(ordering(), Some(Ordering::Greater | Ordering::Equal))
        }
        ComparisonOp::IsNull => left.is_null(),
        ComparisonOp::IsNotNull => !left.is_null(),
    }
}
