use std::{
    sync::mpsc::{self, Receiver, Sender, SyncSender},
    thread::{self, JoinHandle},
    time::Duration,
};

use rusqlite::{
    OpenFlags, Rows, Statement, Transaction, params_from_iter,
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
};
use tracing::{debug, warn};

use crate::{
    config::DatabaseConfig,
    executor::scan::Scanner,
    storage::{
        connection::{Connection, ConnectionProvider},
        query::Query,
    },
    types::{error::DatabaseError, row::Row, value::Value},
};

/// Opens connections to one SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    config: DatabaseConfig,
    target: String,
}

impl SqliteProvider {
    pub fn new(config: DatabaseConfig) -> Self {
        let target = config.path.display().to_string();
        Self { config, target }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Opens the database, creating the file if it does not exist yet.
    pub fn open_or_create(&self) -> Result<SqliteConnection, DatabaseError> {
        self.connect(OpenFlags::default())
    }

    fn connect(&self, flags: OpenFlags) -> Result<SqliteConnection, DatabaseError> {
        let connection_failure = |e: rusqlite::Error| DatabaseError::ConnectionFailure {
            target: self.target.clone(),
            details: e.to_string(),
        };
        let conn = rusqlite::Connection::open_with_flags(&self.config.path, flags)
            .map_err(connection_failure)?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(connection_failure)?;
        debug!(database = %self.target, "connection opened");
        Ok(SqliteConnection {
            conn,
            target: self.target.clone(),
        })
    }
}

impl ConnectionProvider for SqliteProvider {
    type Connection = SqliteConnection;

    /// Scans never create the database: a missing file is a connection failure.
    fn open(&self) -> Result<SqliteConnection, DatabaseError> {
        self.connect(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    fn target(&self) -> &str {
        &self.target
    }
}

pub struct SqliteConnection {
    conn: rusqlite::Connection,
    target: String,
}

impl SqliteConnection {
    pub fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>, DatabaseError> {
        Ok(self.conn.transaction()?)
    }

    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Connection for SqliteConnection {
    type Cursor = SqliteCursor;

    /// Hands the connection to a worker thread that prepares the statement
    /// and then steps it only when the cursor asks for rows.
    fn query(self, query: &Query) -> Result<SqliteCursor, DatabaseError> {
        let SqliteConnection { conn, target } = self;
        let (request_tx, request_rx) = mpsc::channel::<usize>();
        let (reply_tx, reply_rx) = mpsc::sync_channel::<Reply>(1);
        let worker_query = query.clone();
        let worker = thread::Builder::new()
            .name("sqlite-cursor".to_string())
            .spawn(move || serve(conn, worker_query, request_rx, reply_tx))?;

        let mut cursor = SqliteCursor {
            requests: Some(request_tx),
            replies: reply_rx,
            worker: Some(worker),
            target,
        };
        let ready = cursor.replies.recv();
        match ready {
            Ok(Reply::Ready) => {
                debug!(database = %cursor.target, sql = %query.sql, "cursor opened");
                Ok(cursor)
            }
            Ok(Reply::Rows(_)) => Err(DatabaseError::query("cursor worker answered out of turn")),
            Ok(Reply::Failed(e)) => {
                cursor.shutdown();
                Err(e)
            }
            Err(_) => {
                cursor.shutdown();
                Err(DatabaseError::query("cursor worker stopped before the query ran"))
            }
        }
    }
}

enum Reply {
    /// Statement prepared and bound; no row has been stepped yet.
    Ready,
    Rows(Vec<Row>),
    Failed(DatabaseError),
}

/// Worker loop. Each request is the maximum number of rows to step; the
/// loop ends when the cursor hangs up, closing the statement and connection.
fn serve(
    conn: rusqlite::Connection,
    query: Query,
    requests: Receiver<usize>,
    replies: SyncSender<Reply>,
) {
    let mut stmt = match conn.prepare(&query.sql) {
        Ok(stmt) => stmt,
        Err(e) => {
            let _ = replies.send(Reply::Failed(DatabaseError::query(format!(
                "{} ({})",
                e, query.sql
            ))));
            return;
        }
    };
    let mut rows = match stmt.query(params_from_iter(query.params.iter())) {
        Ok(rows) => rows,
        Err(e) => {
            let _ = replies.send(Reply::Failed(DatabaseError::query(format!(
                "{} ({})",
                e, query.sql
            ))));
            return;
        }
    };
    if replies.send(Reply::Ready).is_err() {
        return;
    }
    while let Ok(limit) = requests.recv() {
        let reply = match step(&mut rows, limit) {
            Ok(batch) => Reply::Rows(batch),
            Err(e) => Reply::Failed(e),
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
}

fn step(rows: &mut Rows<'_>, limit: usize) -> Result<Vec<Row>, DatabaseError> {
    let mut batch = Vec::new();
    while batch.len() < limit {
        match rows.next() {
            Ok(Some(row)) => batch.push(convert_row(row)?),
            Ok(None) => break,
            Err(e) => return Err(DatabaseError::query(e.to_string())),
        }
    }
    Ok(batch)
}

/// Streaming cursor over one SQLite query.
///
/// The connection lives on a dedicated worker thread. Rows are stepped by
/// SQLite only when `scan`/`scan_batch` asks for them, so at most one
/// request's worth of rows is in flight. Dropping the cursor stops the
/// worker and waits for it, so the connection is closed when drop returns.
pub struct SqliteCursor {
    requests: Option<Sender<usize>>,
    replies: Receiver<Reply>,
    worker: Option<JoinHandle<()>>,
    target: String,
}

impl SqliteCursor {
    fn fetch(&mut self, limit: usize) -> Result<Vec<Row>, DatabaseError> {
        let Some(requests) = self.requests.as_ref() else {
            return Ok(Vec::new());
        };
        if requests.send(limit).is_err() {
            return Err(DatabaseError::query("cursor worker has stopped"));
        }
        match self.replies.recv() {
            Ok(Reply::Rows(rows)) => Ok(rows),
            Ok(Reply::Failed(e)) => Err(e),
            Ok(Reply::Ready) => Err(DatabaseError::query("cursor worker answered out of turn")),
            Err(_) => Err(DatabaseError::query("cursor worker has stopped")),
        }
    }

    fn shutdown(&mut self) {
        // hanging up ends the worker loop
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(database = %self.target, "cursor worker panicked");
            }
        }
    }
}

impl Scanner for SqliteCursor {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError> {
        Ok(self.fetch(1)?.into_iter().next())
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError> {
        if batch_size == 0 {
            return Ok(Vec::new());
        }
        self.fetch(batch_size)
    }
}

impl Drop for SqliteCursor {
    fn drop(&mut self) {
        self.shutdown();
        debug!(database = %self.target, "cursor released");
    }
}

fn convert_row(row: &rusqlite::Row<'_>) -> Result<Row, DatabaseError> {
    let statement: &Statement<'_> = row.as_ref();
    let column_count = statement.column_count();
    let mut values = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value_ref = row
            .get_ref(index)
            .map_err(|e| DatabaseError::query(e.to_string()))?;
        values.push(match value_ref {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|e| DatabaseError::TypeMismatch {
                    expected: "UTF-8 text".to_string(),
                    actual: e.to_string(),
                })?;
                Value::Text(text.to_string())
            }
            ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        });
    }
    Ok(Row::new(values))
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(r) => ToSqlOutput::from(*r),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Blob(b) => ToSqlOutput::from(b.as_slice()),
            // text keeps the exact digits
            Value::Decimal(d) => ToSqlOutput::from(d.to_string()),
        })
    }
}
