use tracing::debug;

use crate::{
    executor::{
        pull::{Pull, PullSource, ScanState, settle},
        scan::Scanner,
    },
    storage::{
        connection::{Connection, ConnectionProvider},
        query::Query,
    },
    types::{error::DatabaseError, row::Row},
};

pub type Decoder<T> = fn(Row) -> Result<T, DatabaseError>;

type CursorOf<P> = <<P as ConnectionProvider>::Connection as Connection>::Cursor;

/// One query, opened lazily on the first fetch and dropped as soon as the
/// scan ends. Dropping the session mid-scan releases the cursor too.
pub(crate) struct CursorSession<P: ConnectionProvider> {
    provider: P,
    query: Query,
    cursor: Option<CursorOf<P>>,
    state: ScanState,
}

impl<P: ConnectionProvider> CursorSession<P> {
    pub(crate) fn new(provider: P, query: Query) -> Self {
        Self {
            provider,
            query,
            cursor: None,
            state: ScanState::NotStarted,
        }
    }

    pub(crate) fn state(&self) -> ScanState {
        self.state
    }

    /// Runs `fetch` against the live cursor. `Ok(None)` from `fetch` ends the scan.
    pub(crate) fn advance<T>(
        &mut self,
        fetch: impl FnOnce(&mut CursorOf<P>) -> Result<Option<T>, DatabaseError>,
    ) -> Pull<T> {
        match self.state {
            ScanState::Exhausted => return Pull::Exhausted,
            ScanState::NotStarted => {
                self.state = ScanState::Active;
                match self.provider.open().and_then(|conn| conn.query(&self.query)) {
                    Ok(cursor) => self.cursor = Some(cursor),
                    Err(e) => {
                        self.finish();
                        return Pull::Failed(e);
                    }
                }
            }
            ScanState::Active => {}
        }
        let Some(cursor) = self.cursor.as_mut() else {
            self.finish();
            return Pull::Exhausted;
        };
        match fetch(cursor) {
            Ok(Some(item)) => Pull::Item(item),
            Ok(None) => {
                self.finish();
                Pull::Exhausted
            }
            Err(e) => {
                self.finish();
                Pull::Failed(e)
            }
        }
    }

    fn finish(&mut self) {
        self.state = ScanState::Exhausted;
        if self.cursor.take().is_some() {
            debug!(database = self.provider.target(), "scan finished, cursor released");
        }
    }
}

/// Streams a query one row per pull.
///
/// Rows are decoded into `T` as they arrive; a decode error counts as a
/// query failure. Iterating directly uses the lenient policy (log and stop);
/// use [`PullSource::fallible`] to see failures as `Err` items.
pub struct RowCursor<P: ConnectionProvider, T = Row> {
    session: CursorSession<P>,
    decode: Decoder<T>,
    last_error: Option<DatabaseError>,
}

impl<P: ConnectionProvider> RowCursor<P, Row> {
    pub fn new(provider: P, query: Query) -> Self {
        Self::with_decoder(provider, query, Ok)
    }
}

impl<P: ConnectionProvider, T> RowCursor<P, T> {
    pub fn with_decoder(provider: P, query: Query, decode: Decoder<T>) -> Self {
        Self {
            session: CursorSession::new(provider, query),
            decode,
            last_error: None,
        }
    }

    /// The failure that ended the last lenient iteration, if any.
    pub fn last_error(&self) -> Option<&DatabaseError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<DatabaseError> {
        self.last_error.take()
    }
}

impl<P: ConnectionProvider, T> PullSource for RowCursor<P, T> {
    type Item = T;

    fn pull(&mut self) -> Pull<T> {
        let decode = self.decode;
        self.session
            .advance(|cursor| cursor.scan()?.map(decode).transpose())
    }

    fn state(&self) -> ScanState {
        self.session.state()
    }
}

impl<P: ConnectionProvider, T> Iterator for RowCursor<P, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let pull = self.pull();
        settle(pull, &mut self.last_error, "row_cursor")
    }
}
