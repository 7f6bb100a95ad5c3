//! Scans over the `user_data` table.
//!
//! Every query here orders by `user_id`, so the cursor, batch and offset
//! scans all see the same sequence.

use rust_decimal::Decimal;
use tracing::info;

use crate::{
    executor::{
        aggregate::RunningMean,
        batch::BatchCursor,
        cursor::RowCursor,
        paginate::{OffsetPaginator, fetch_page},
        predicate::Predicate,
        pull::PullSource,
    },
    storage::{connection::ConnectionProvider, schema::TableSchema},
    types::{
        RowOffset,
        error::{DatabaseError, MAX_FETCH_SIZE},
        record::{UserRecord, decode_age},
    },
};

/// Counters from filtering a batch stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub examined: usize,
    pub batches: usize,
    pub matched: usize,
}

/// One user per pull.
pub fn stream_users<P: ConnectionProvider>(provider: P) -> RowCursor<P, UserRecord> {
    RowCursor::with_decoder(
        provider,
        TableSchema::user_data().select_all(),
        UserRecord::from_row,
    )
}

/// Only the `age` column, one value per pull.
pub fn stream_user_ages<P: ConnectionProvider>(
    provider: P,
) -> Result<RowCursor<P, Decimal>, DatabaseError> {
    let query = TableSchema::user_data().select_column("age")?;
    Ok(RowCursor::with_decoder(provider, query, decode_age))
}

pub fn stream_users_in_batches<P: ConnectionProvider>(
    provider: P,
    batch_size: usize,
) -> Result<BatchCursor<P, UserRecord>, DatabaseError> {
    BatchCursor::with_decoder(
        provider,
        TableSchema::user_data().select_all(),
        batch_size,
        UserRecord::from_row,
    )
}

/// A single page of users starting at `offset`.
pub fn paginate_users<P: ConnectionProvider>(
    provider: &P,
    page_size: usize,
    offset: RowOffset,
) -> Result<Vec<UserRecord>, DatabaseError> {
    if page_size == 0 || page_size > MAX_FETCH_SIZE {
        return Err(DatabaseError::InvalidPageSize { size: page_size });
    }
    let query = TableSchema::user_data().paged_select_all()?;
    fetch_page(provider, &query, page_size, offset, UserRecord::from_row)
}

pub fn lazy_paginate<P: ConnectionProvider>(
    provider: P,
    page_size: usize,
) -> Result<OffsetPaginator<P, UserRecord>, DatabaseError> {
    let query = TableSchema::user_data().paged_select_all()?;
    OffsetPaginator::with_decoder(provider, query, page_size, UserRecord::from_row)
}

/// Mean age over a streamed `age` projection. `None` for an empty table
/// or when the scan could not start.
pub fn calculate_average_age<P: ConnectionProvider>(provider: P) -> Option<Decimal> {
    let mut ages = stream_user_ages(provider).ok()?;
    let mean: RunningMean = ages.by_ref().collect();
    if let Some(e) = ages.last_error() {
        info!(observed = mean.count(), error = %e, "average computed over a partial scan");
    }
    mean.mean()
}

/// Streams users in batches and hands each one matching `predicate` to
/// `on_match` as it is read. Only the current batch is held in memory.
///
/// Failures propagate: a report is only returned for a complete scan.
pub fn batch_processing<P, F>(
    provider: P,
    batch_size: usize,
    predicate: &Predicate,
    mut on_match: F,
) -> Result<BatchReport, DatabaseError>
where
    P: ConnectionProvider,
    F: FnMut(UserRecord),
{
    let schema = TableSchema::user_data();
    let batches = BatchCursor::new(provider, schema.select_all(), batch_size)?;
    let mut report = BatchReport::default();
    for page in batches.fallible() {
        let page = page?;
        report.batches += 1;
        report.examined += page.len();
        for row in page {
            if predicate.evaluate(&row, &schema)? {
                report.matched += 1;
                on_match(UserRecord::from_row(row)?);
            }
        }
    }
    info!(
        examined = report.examined,
        batches = report.batches,
        matched = report.matched,
        "batch processing finished"
    );
    Ok(report)
}
