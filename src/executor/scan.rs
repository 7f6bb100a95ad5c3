use crate::types::{error::DatabaseError, row::Row};

const BATCH_PREALLOC: usize = 256;

/// Fetch primitives over one executed query.
///
/// `None` / an empty batch means the result set is exhausted. Implementors
/// release their underlying resources when dropped.
pub trait Scanner {
    /// Fetch one row.
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError>;

    /// Fetch up to `batch_size` rows; shorter (or empty) near the end.
    ///
    /// Storage grows with the rows actually returned, not the size asked for.
    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = Vec::with_capacity(batch_size.min(BATCH_PREALLOC));
        for _ in 0..batch_size {
            match self.scan()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Fetch everything that is left. Only meant for bounded queries.
    fn scan_all(&mut self) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = Vec::new();
        while let Some(row) = self.scan()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl<S: Scanner + ?Sized> Scanner for Box<S> {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError> {
        (**self).scan()
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError> {
        (**self).scan_batch(batch_size)
    }

    fn scan_all(&mut self) -> Result<Vec<Row>, DatabaseError> {
        (**self).scan_all()
    }
}
