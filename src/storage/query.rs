use sqlparser::{ast::Statement, dialect::SQLiteDialect, parser::Parser};
use tracing::warn;

use crate::types::{RowOffset, error::DatabaseError, value::Value};

/// LIMIT/OFFSET window attached to a paginated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: usize,
    pub offset: RowOffset,
}

/// SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<Value>,
    /// Set when the query was cut from a `PagedQuery`.
    pub window: Option<Window>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            window: None,
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// A single SELECT that can be re-issued as bounded `LIMIT ? OFFSET ?` requests.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedQuery {
    base: String,
    params: Vec<Value>,
    ordered: bool,
}

impl PagedQuery {
    /// Validates `sql` as a paginatable SELECT.
    ///
    /// The statement must be a single query without its own LIMIT/OFFSET.
    /// A query without ORDER BY is accepted but logged: offsets only line up
    /// across requests when the order is stable.
    pub fn parse(sql: &str) -> Result<Self, DatabaseError> {
        let mut statements = Parser::parse_sql(&SQLiteDialect {}, sql).map_err(|e| {
            DatabaseError::SqlParseError {
                details: e.to_string(),
            }
        })?;
        if statements.len() != 1 {
            return Err(DatabaseError::SqlParseError {
                details: format!("expected exactly one statement, found {}", statements.len()),
            });
        }
        let Statement::Query(query) = statements.remove(0) else {
            return Err(DatabaseError::SqlParseError {
                details: "paginated statement must be a SELECT".to_string(),
            });
        };
        if query.limit.is_some() || query.offset.is_some() {
            return Err(DatabaseError::SqlParseError {
                details: "paginated query already has LIMIT/OFFSET".to_string(),
            });
        }
        let ordered = query.order_by.is_some();
        if !ordered {
            warn!(
                sql,
                "paginating a query without ORDER BY; concurrent writes may duplicate or skip rows"
            );
        }
        Ok(Self {
            base: sql.trim().trim_end_matches(';').trim_end().to_string(),
            params: Vec::new(),
            ordered,
        })
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn base_sql(&self) -> &str {
        &self.base
    }

    /// The request for rows `[offset, offset + limit)`.
    ///
    /// SQLite binds LIMIT/OFFSET as signed 64-bit integers, and a negative
    /// value means "no limit", so anything past `i64::MAX` is refused.
    pub fn page(&self, limit: usize, offset: RowOffset) -> Result<Query, DatabaseError> {
        let bound_limit =
            i64::try_from(limit).map_err(|_| DatabaseError::InvalidPageSize { size: limit })?;
        let bound_offset = i64::try_from(offset).map_err(|_| DatabaseError::OffsetOverflow {
            details: format!("offset {} does not fit a signed 64-bit OFFSET", offset),
        })?;
        let mut params = self.params.clone();
        params.push(Value::Integer(bound_limit));
        params.push(Value::Integer(bound_offset));
        Ok(Query {
            sql: format!("{} LIMIT ? OFFSET ?", self.base),
            params,
            window: Some(Window { limit, offset }),
        })
    }
}
