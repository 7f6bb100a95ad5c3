use crate::{
    executor::{
        cursor::{CursorSession, Decoder},
        pull::{Pull, PullSource, ScanState, settle},
        scan::Scanner,
    },
    storage::{connection::ConnectionProvider, query::Query},
    types::{PageNumber, RowOffset, error::DatabaseError, page::Page, row::Row},
};

/// Streams a query in pages of `batch_size` rows over a single cursor.
///
/// Each pull is one bulk fetch. The scan ends at the first empty chunk, so
/// every page but the last is full.
pub struct BatchCursor<P: ConnectionProvider, T = Row> {
    session: CursorSession<P>,
    decode: Decoder<T>,
    batch_size: usize,
    next_number: PageNumber,
    next_offset: RowOffset,
    last_error: Option<DatabaseError>,
}

impl<P: ConnectionProvider> BatchCursor<P, Row> {
    pub fn new(provider: P, query: Query, batch_size: usize) -> Result<Self, DatabaseError> {
        Self::with_decoder(provider, query, batch_size, Ok)
    }
}

impl<P: ConnectionProvider, T> BatchCursor<P, T> {
    /// Fails with `InvalidBatchSize` for a zero size, before any connection is made.
    pub fn with_decoder(
        provider: P,
        query: Query,
        batch_size: usize,
        decode: Decoder<T>,
    ) -> Result<Self, DatabaseError> {
        if batch_size == 0 {
            return Err(DatabaseError::InvalidBatchSize { size: batch_size });
        }
        Ok(Self {
            session: CursorSession::new(provider, query),
            decode,
            batch_size,
            next_number: 0,
            next_offset: 0,
            last_error: None,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn last_error(&self) -> Option<&DatabaseError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<DatabaseError> {
        self.last_error.take()
    }
}

impl<P: ConnectionProvider, T> PullSource for BatchCursor<P, T> {
    type Item = Page<T>;

    fn pull(&mut self) -> Pull<Page<T>> {
        let decode = self.decode;
        let batch_size = self.batch_size;
        let pull = self.session.advance(|cursor| {
            let rows = cursor.scan_batch(batch_size)?;
            if rows.is_empty() {
                return Ok(None);
            }
            rows.into_iter()
                .map(decode)
                .collect::<Result<Vec<T>, DatabaseError>>()
                .map(Some)
        });
        pull.map(|records| {
            let page = Page::new(self.next_number, self.next_offset, records);
            self.next_number += 1;
            self.next_offset = page.end_offset();
            page
        })
    }

    fn state(&self) -> ScanState {
        self.session.state()
    }
}

impl<P: ConnectionProvider, T> Iterator for BatchCursor<P, T> {
    type Item = Page<T>;

    fn next(&mut self) -> Option<Page<T>> {
        let pull = self.pull();
        settle(pull, &mut self.last_error, "batch_cursor")
    }
}
