use tracing::debug;

use crate::{
    executor::{
        cursor::Decoder,
        pull::{Pull, PullSource, ScanState, settle},
        scan::Scanner,
    },
    storage::{
        connection::{Connection, ConnectionProvider},
        query::PagedQuery,
    },
    types::{
        PageNumber, RowOffset,
        error::{DatabaseError, MAX_FETCH_SIZE},
        page::Page,
        row::Row,
    },
};

/// Fetches one page: opens a connection, runs `LIMIT page_size OFFSET offset`,
/// reads the whole (bounded) result and releases the connection.
pub fn fetch_page<P: ConnectionProvider, T>(
    provider: &P,
    query: &PagedQuery,
    page_size: usize,
    offset: RowOffset,
    decode: Decoder<T>,
) -> Result<Vec<T>, DatabaseError> {
    let rows = {
        let request = query.page(page_size, offset)?;
        let mut cursor = provider.open()?.query(&request)?;
        cursor.scan_all()?
    };
    rows.into_iter().map(decode).collect()
}

/// Offset pagination: page `k` is an independent request for
/// `LIMIT page_size OFFSET k * page_size`.
///
/// No cursor or connection is held between pages, so a recycled connection
/// does not break the scan. The sequence ends at the first empty page and
/// can be replayed with [`restart`](Self::restart) or resumed at any page
/// with [`seek`](Self::seek).
pub struct OffsetPaginator<P: ConnectionProvider, T = Row> {
    provider: P,
    query: PagedQuery,
    decode: Decoder<T>,
    page_size: usize,
    next_page: PageNumber,
    state: ScanState,
    last_error: Option<DatabaseError>,
}

impl<P: ConnectionProvider> OffsetPaginator<P, Row> {
    pub fn new(provider: P, query: PagedQuery, page_size: usize) -> Result<Self, DatabaseError> {
        Self::with_decoder(provider, query, page_size, Ok)
    }
}

impl<P: ConnectionProvider, T> OffsetPaginator<P, T> {
    /// Fails with `InvalidPageSize` for a zero size or one too large to bind
    /// as a LIMIT, before any connection is made.
    pub fn with_decoder(
        provider: P,
        query: PagedQuery,
        page_size: usize,
        decode: Decoder<T>,
    ) -> Result<Self, DatabaseError> {
        if page_size == 0 || page_size > MAX_FETCH_SIZE {
            return Err(DatabaseError::InvalidPageSize { size: page_size });
        }
        Ok(Self {
            provider,
            query,
            decode,
            page_size,
            next_page: 0,
            state: ScanState::NotStarted,
            last_error: None,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Index of the page the next pull will request.
    pub fn next_page(&self) -> PageNumber {
        self.next_page
    }

    /// Scan position of the first row of `page`; `None` when it cannot be
    /// represented.
    pub fn offset_of(&self, page: PageNumber) -> Option<RowOffset> {
        page.checked_mul(self.page_size)
    }

    /// Replays the sequence from page 0.
    pub fn restart(&mut self) {
        self.seek(0);
    }

    /// Continues from `page`; the following pull re-issues that request.
    pub fn seek(&mut self, page: PageNumber) {
        self.next_page = page;
        self.state = ScanState::NotStarted;
        self.last_error = None;
    }

    pub fn last_error(&self) -> Option<&DatabaseError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<DatabaseError> {
        self.last_error.take()
    }
}

impl<P: ConnectionProvider, T> PullSource for OffsetPaginator<P, T> {
    type Item = Page<T>;

    fn pull(&mut self) -> Pull<Page<T>> {
        if self.state == ScanState::Exhausted {
            return Pull::Exhausted;
        }
        self.state = ScanState::Active;
        let Some(offset) = self.offset_of(self.next_page) else {
            self.state = ScanState::Exhausted;
            return Pull::Failed(DatabaseError::OffsetOverflow {
                details: format!(
                    "page {} of size {} is past the addressable range",
                    self.next_page, self.page_size
                ),
            });
        };
        debug!(page = self.next_page, offset, limit = self.page_size, "requesting page");
        match fetch_page(&self.provider, &self.query, self.page_size, offset, self.decode) {
            Ok(records) if records.is_empty() => {
                self.state = ScanState::Exhausted;
                Pull::Exhausted
            }
            Ok(records) => {
                let page = Page::new(self.next_page, offset, records);
                match self.next_page.checked_add(1) {
                    Some(next) => self.next_page = next,
                    None => self.state = ScanState::Exhausted,
                }
                Pull::Item(page)
            }
            Err(e) => {
                self.state = ScanState::Exhausted;
                Pull::Failed(e)
            }
        }
    }

    fn state(&self) -> ScanState {
        self.state
    }
}

impl<P: ConnectionProvider, T> Iterator for OffsetPaginator<P, T> {
    type Item = Page<T>;

    fn next(&mut self) -> Option<Page<T>> {
        let pull = self.pull();
        settle(pull, &mut self.last_error, "offset_paginator")
    }
}
