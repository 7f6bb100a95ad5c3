use std::{
    ops::Range,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use rust_decimal::Decimal;
use tempfile::TempDir;

use crate::{
    config::DatabaseConfig,
    executor::scan::Scanner,
    storage::{
        connection::{Connection, ConnectionProvider},
        query::Query,
        schema::TableSchema,
        seed::{NewUser, SeedReport, create_table, insert_data},
        sqlite::SqliteProvider,
    },
    types::{error::DatabaseError, row::Row, value::Value},
};

/// `count` user rows with ids in ascending order and ages cycling 18..=57.
pub fn user_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::new(vec![
                Value::Text(format!("user-{:05}", i)),
                Value::Text(format!("User {}", i)),
                Value::Text(format!("user{}@example.com", i)),
                Value::Decimal(Decimal::from(18 + (i % 40) as i64)),
            ])
        })
        .collect()
}

pub fn new_users(count: usize) -> Vec<NewUser> {
    (0..count)
        .map(|i| NewUser {
            name: format!("User {}", i),
            email: format!("user{}@example.com", i),
            age: Decimal::from(18 + (i % 40) as i64),
        })
        .collect()
}

#[derive(Debug, Default)]
struct MockStats {
    opened: AtomicUsize,
    released: AtomicUsize,
}

/// Counts one release when dropped. Moves from the connection into the cursor.
#[derive(Debug)]
struct ReleaseGuard {
    stats: Arc<MockStats>,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory provider serving a fixed set of rows.
///
/// Every query returns the rows in stored order; a LIMIT/OFFSET window on
/// the query is honored, the SQL text is not interpreted. Clones share
/// their counters, so a test can hand a clone to a scan and inspect the
/// original afterwards.
#[derive(Debug, Clone)]
pub struct MockProvider {
    rows: Arc<Vec<Row>>,
    stats: Arc<MockStats>,
    queries: Arc<Mutex<Vec<Query>>>,
    fail_open: bool,
    fail_query: bool,
    fail_after: Option<usize>,
}

impl MockProvider {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(rows),
            stats: Arc::default(),
            queries: Arc::default(),
            fail_open: false,
            fail_query: false,
            fail_after: None,
        }
    }

    pub fn with_users(count: usize) -> Self {
        Self::new(user_rows(count))
    }

    /// Every `open` fails with a connection failure.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Connections open, but executing a query fails.
    pub fn failing_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    /// Each cursor fails once it has delivered `rows` rows.
    pub fn fail_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }

    pub fn opened(&self) -> usize {
        self.stats.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.stats.released.load(Ordering::SeqCst)
    }

    /// Connections opened and not yet released.
    pub fn live(&self) -> usize {
        self.opened() - self.released()
    }

    /// Every query executed so far, in order.
    pub fn queries(&self) -> Vec<Query> {
        match self.queries.lock() {
            Ok(queries) => queries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ConnectionProvider for MockProvider {
    type Connection = MockConnection;

    fn open(&self) -> Result<MockConnection, DatabaseError> {
        if self.fail_open {
            return Err(DatabaseError::ConnectionFailure {
                target: self.target().to_string(),
                details: "connection refused".to_string(),
            });
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            provider: self.clone(),
            guard: ReleaseGuard {
                stats: Arc::clone(&self.stats),
            },
        })
    }

    fn target(&self) -> &str {
        "mock"
    }
}

pub struct MockConnection {
    provider: MockProvider,
    guard: ReleaseGuard,
}

impl Connection for MockConnection {
    type Cursor = MockCursor;

    fn query(self, query: &Query) -> Result<MockCursor, DatabaseError> {
        let MockConnection { provider, guard } = self;
        if let Ok(mut queries) = provider.queries.lock() {
            queries.push(query.clone());
        }
        if provider.fail_query {
            return Err(DatabaseError::query(format!("mock rejected: {}", query.sql)));
        }
        let total = provider.rows.len();
        let range = match query.window {
            Some(window) => {
                let start = window.offset.min(total);
                start..start.saturating_add(window.limit).min(total)
            }
            None => 0..total,
        };
        Ok(MockCursor {
            rows: Arc::clone(&provider.rows),
            range,
            delivered: 0,
            fail_after: provider.fail_after,
            _guard: guard,
        })
    }
}

pub struct MockCursor {
    rows: Arc<Vec<Row>>,
    range: Range<usize>,
    delivered: usize,
    fail_after: Option<usize>,
    _guard: ReleaseGuard,
}

impl Scanner for MockCursor {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError> {
        if self.fail_after == Some(self.delivered) {
            return Err(DatabaseError::query(format!(
                "injected fault after {} rows",
                self.delivered
            )));
        }
        match self.range.next() {
            Some(index) => {
                self.delivered += 1;
                Ok(Some(self.rows[index].clone()))
            }
            None => Ok(None),
        }
    }
}

/// A SQLite file in a private temporary directory, removed on drop.
pub struct TempDatabase {
    pub path: PathBuf,
    _dir: TempDir,
}

impl TempDatabase {
    pub fn new() -> Result<Self, DatabaseError> {
        Self::with_prefix("rowstream")
    }

    pub fn with_prefix(prefix: &str) -> Result<Self, DatabaseError> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().join("users.db");
        Ok(Self { path, _dir: dir })
    }

    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.path)
    }

    pub fn provider(&self) -> SqliteProvider {
        SqliteProvider::new(self.config())
    }

    /// Creates `user_data` and inserts `users`.
    pub fn with_users(&self, users: &[NewUser]) -> Result<SeedReport, DatabaseError> {
        let schema = TableSchema::user_data();
        let mut conn = self.provider().open_or_create()?;
        create_table(&conn, &schema)?;
        insert_data(&mut conn, &schema, users)
    }
}
