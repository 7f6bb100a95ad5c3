use serde::{Deserialize, Serialize};

use crate::{
    storage::query::{PagedQuery, Query},
    types::{
        AGE_PRECISION, AGE_SCALE,
        error::DatabaseError,
        row::Row,
        value::{DataType, Value},
    },
};

pub const USER_TABLE: &str = "user_data";

/// Represents a column definition in a table schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    pub position: usize,
    pub nullable: bool,
    pub primary_key: bool,
    /// Declared length for VARCHAR columns.
    pub max_length: Option<u32>,
}

impl ColumnSchema {
    pub fn new(name: &str, data_type: DataType, position: usize) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            position,
            nullable: true,
            primary_key: false,
            max_length: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false; // Primary keys are always NOT NULL
        self
    }

    pub fn varchar(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    fn definition(&self) -> String {
        let type_name = match (&self.data_type, self.max_length) {
            (DataType::Text, Some(len)) => format!("VARCHAR({})", len),
            (data_type, _) => data_type.sql_name(),
        };
        let mut sql = format!("{} {}", self.name, type_name);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

/// Represents a complete table schema with all column definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(table_name: &str, columns: Vec<ColumnSchema>) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns,
        }
    }

    /// `user_data(user_id, name, email, age)`.
    pub fn user_data() -> Self {
        Self::new(
            USER_TABLE,
            vec![
                ColumnSchema::new("user_id", DataType::Text, 0)
                    .varchar(36)
                    .primary_key(),
                ColumnSchema::new("name", DataType::Text, 1)
                    .varchar(255)
                    .not_null(),
                ColumnSchema::new("email", DataType::Text, 2)
                    .varchar(255)
                    .not_null(),
                ColumnSchema::new(
                    "age",
                    DataType::Decimal {
                        precision: AGE_PRECISION,
                        scale: AGE_SCALE,
                    },
                    3,
                )
                .not_null(),
            ],
        )
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Get column index by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// Get all column names in order
    pub fn column_names(&self) -> Vec<&str> {
        let mut sorted_columns: Vec<&ColumnSchema> = self.columns.iter().collect();
        sorted_columns.sort_by_key(|col| col.position);
        sorted_columns.iter().map(|col| col.name.as_str()).collect()
    }

    pub fn primary_key_column(&self) -> Option<&ColumnSchema> {
        self.columns.iter().find(|col| col.primary_key)
    }

    fn require_column(&self, name: &str) -> Result<&ColumnSchema, DatabaseError> {
        self.get_column(name)
            .ok_or_else(|| DatabaseError::ColumnNotFound {
                name: name.to_string(),
                table: self.table_name.clone(),
            })
    }

    /// Column used to give scans a stable order: the primary key, or the
    /// first column when there is none.
    fn order_column(&self) -> &str {
        self.primary_key_column()
            .or_else(|| self.columns.first())
            .map(|col| col.name.as_str())
            .unwrap_or("rowid")
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnSchema::definition).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table_name,
            columns.join(", ")
        )
    }

    /// Non-unique index on `column`, used by the seeder's email lookups.
    pub fn create_index_sql(&self, column: &str) -> Result<String, DatabaseError> {
        let column = self.require_column(column)?;
        Ok(format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{col} ON {table} ({col})",
            table = self.table_name,
            col = column.name
        ))
    }

    /// Full scan in primary-key order.
    pub fn select_all(&self) -> Query {
        Query::new(self.select_all_sql())
    }

    /// Single-column projection in primary-key order.
    pub fn select_column(&self, name: &str) -> Result<Query, DatabaseError> {
        let column = self.require_column(name)?;
        Ok(Query::new(format!(
            "SELECT {} FROM {} ORDER BY {}",
            column.name,
            self.table_name,
            self.order_column()
        )))
    }

    /// Full scan ready to be cut into pages.
    pub fn paged_select_all(&self) -> Result<PagedQuery, DatabaseError> {
        PagedQuery::parse(&self.select_all_sql())
    }

    pub fn insert_sql(&self) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name,
            self.column_names().join(", "),
            placeholders
        )
    }

    /// `SELECT 1 ... WHERE column = ?`, for existence checks.
    pub fn exists_sql(&self, column: &str) -> Result<String, DatabaseError> {
        let column = self.require_column(column)?;
        Ok(format!(
            "SELECT 1 FROM {} WHERE {} = ? LIMIT 1",
            self.table_name, column.name
        ))
    }

    fn select_all_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.column_names().join(", "),
            self.table_name,
            self.order_column()
        )
    }

    /// Validate a row against this schema
    pub fn validate_row(&self, row: &Row) -> Result<(), DatabaseError> {
        // Check column count
        if row.values.len() != self.columns.len() {
            return Err(DatabaseError::InvalidData {
                details: format!(
                    "Row has {} values but table '{}' expects {} columns",
                    row.values.len(),
                    self.table_name,
                    self.columns.len()
                ),
            });
        }

        for column in &self.columns {
            let value = row.value(column.position)?;
            if !column.nullable && matches!(value, Value::Null) {
                return Err(DatabaseError::InvalidData {
                    details: format!("Column '{}' cannot be NULL", column.name),
                });
            }
            if !value.is_compatible_with_type(&column.data_type) {
                return Err(DatabaseError::InvalidData {
                    details: format!(
                        "Value {:?} is not compatible with column '{}' of type {}",
                        value, column.name, column.data_type
                    ),
                });
            }
        }

        Ok(())
    }
}
