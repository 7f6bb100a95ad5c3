use std::{path::Path, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use rusqlite::params;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    storage::{
        schema::TableSchema,
        sqlite::{SqliteConnection, SqliteProvider},
    },
    types::{AGE_PRECISION, AGE_SCALE, error::DatabaseError},
};

/// One CSV line as written in the input file.
#[derive(Debug, Deserialize)]
struct CsvUser {
    name: String,
    email: String,
    age: String,
}

/// A user waiting to be inserted; the id is assigned at insert time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: Decimal,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CsvLoad {
    pub users: Vec<NewUser>,
    /// Lines skipped because `age` was not a number or out of range.
    pub invalid: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    /// Rows whose email was already present.
    pub duplicates: usize,
    pub invalid: usize,
}

/// Parses an age as `DECIMAL(5, 2)` stores it: rounded half away from zero
/// to two places, and rejected when it needs more than five digits.
pub fn parse_age(raw: &str) -> Option<Decimal> {
    let age = Decimal::from_str(raw.trim())
        .ok()?
        .round_dp_with_strategy(AGE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    let limit = Decimal::new(10i64.pow(AGE_PRECISION) - 1, AGE_SCALE);
    (age.abs() <= limit).then_some(age)
}

/// Reads `name,email,age` records. Lines whose age is not a number or does
/// not fit the column are skipped.
pub fn load_data_from_csv(path: &Path) -> Result<CsvLoad, DatabaseError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut load = CsvLoad::default();
    for (line, record) in reader.deserialize::<CsvUser>().enumerate() {
        let record = record?;
        match parse_age(&record.age) {
            Some(age) => load.users.push(NewUser {
                name: record.name,
                email: record.email,
                age,
            }),
            None => {
                warn!(line = line + 2, age = %record.age, name = %record.name, "skipping row with invalid age");
                load.invalid += 1;
            }
        }
    }
    Ok(load)
}

pub fn create_table(conn: &SqliteConnection, schema: &TableSchema) -> Result<(), DatabaseError> {
    conn.execute_batch(&schema.create_sql())?;
    conn.execute_batch(&schema.create_index_sql("email")?)?;
    info!(table = %schema.table_name, "table ensured");
    Ok(())
}

/// Inserts every user whose email is not in the table yet, in one transaction.
pub fn insert_data(
    conn: &mut SqliteConnection,
    schema: &TableSchema,
    users: &[NewUser],
) -> Result<SeedReport, DatabaseError> {
    let mut report = SeedReport::default();
    if users.is_empty() {
        return Ok(report);
    }
    let exists_sql = schema.exists_sql("email")?;
    let insert_sql = schema.insert_sql();
    let tx = conn.transaction()?;
    {
        let mut check = tx.prepare(&exists_sql)?;
        let mut insert = tx.prepare(&insert_sql)?;
        for user in users {
            if check.exists([&user.email])? {
                report.duplicates += 1;
                continue;
            }
            insert.execute(params![
                Uuid::new_v4().to_string(),
                user.name,
                user.email,
                user.age.to_string(),
            ])?;
            report.inserted += 1;
        }
    }
    tx.commit()?;
    info!(
        inserted = report.inserted,
        duplicates = report.duplicates,
        "user data inserted"
    );
    Ok(report)
}

/// Creates the database file and table if needed, then loads `csv_path` into it.
pub fn seed(provider: &SqliteProvider, csv_path: &Path) -> Result<SeedReport, DatabaseError> {
    let schema = TableSchema::user_data();
    let mut conn = provider.open_or_create()?;
    create_table(&conn, &schema)?;
    let load = load_data_from_csv(csv_path)?;
    let mut report = insert_data(&mut conn, &schema, &load.users)?;
    report.invalid = load.invalid;
    Ok(report)
}
