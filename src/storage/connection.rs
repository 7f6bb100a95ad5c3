use crate::{
    executor::scan::Scanner,
    storage::query::Query,
    types::error::DatabaseError,
};

/// Hands out live connections to one named data store.
///
/// `open` is called once per scan (or once per page for offset pagination).
/// Failures must be reported as `DatabaseError::ConnectionFailure`.
pub trait ConnectionProvider {
    type Connection: Connection;

    fn open(&self) -> Result<Self::Connection, DatabaseError>;

    /// Name of the data store, for diagnostics.
    fn target(&self) -> &str;
}

/// A live connection that can run one query.
///
/// `query` consumes the connection: the returned cursor owns it, so dropping
/// the cursor releases both.
pub trait Connection {
    type Cursor: Scanner;

    fn query(self, query: &Query) -> Result<Self::Cursor, DatabaseError>;
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    type Connection = P::Connection;

    fn open(&self) -> Result<Self::Connection, DatabaseError> {
        (**self).open()
    }

    fn target(&self) -> &str {
        (**self).target()
    }
}
