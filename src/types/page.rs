use serde::{Deserialize, Serialize};

use crate::types::{PageNumber, RowOffset, row::Row};

/*
 * A page is a window over an ordered scan:
 *
 *   scan:   r0 r1 r2 | r3 r4 r5 | r6 r7
 *   pages:  #0 @0    | #1 @3    | #2 @6 (short)
 *
 * `number` is the 0-based page index, `offset` the scan position of the
 * first record. Every page but the last holds exactly the configured size.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T = Row> {
    pub number: PageNumber,
    pub offset: RowOffset,
    pub records: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(number: PageNumber, offset: RowOffset, records: Vec<T>) -> Self {
        Self {
            number,
            offset,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Scan position one past the last record of this page.
    pub fn end_offset(&self) -> RowOffset {
        self.offset + self.records.len()
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            number: self.number,
            offset: self.offset,
            records: self.records.into_iter().map(f).collect(),
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
