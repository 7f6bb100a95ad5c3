use tracing::{error, warn};

use crate::types::error::{DatabaseError, ErrorClass};

/// Outcome of asking a scan for its next element.
#[derive(Debug)]
pub enum Pull<T> {
    Item(T),
    /// No more data. Terminal.
    Exhausted,
    /// The scan broke. The scan is exhausted afterwards.
    Failed(DatabaseError),
}

impl<T> Pull<T> {
    pub fn is_item(&self) -> bool {
        matches!(self, Pull::Item(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Pull::Exhausted)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Pull<U> {
        match self {
            Pull::Item(item) => Pull::Item(f(item)),
            Pull::Exhausted => Pull::Exhausted,
            Pull::Failed(e) => Pull::Failed(e),
        }
    }

    pub fn into_result(self) -> Result<Option<T>, DatabaseError> {
        match self {
            Pull::Item(item) => Ok(Some(item)),
            Pull::Exhausted => Ok(None),
            Pull::Failed(e) => Err(e),
        }
    }
}

/// Lifecycle shared by every scan.
///
/// `NotStarted -> Active` on the first pull, `Active -> Exhausted` on an
/// empty fetch or a failure. `Exhausted` never changes again (until an
/// explicit restart, for components that support it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    NotStarted,
    Active,
    Exhausted,
}

/// A resumable scan driven one element at a time by its caller.
pub trait PullSource {
    type Item;

    fn pull(&mut self) -> Pull<Self::Item>;

    fn state(&self) -> ScanState;

    /// Strict view of the scan: failures come out as `Err` instead of
    /// silently ending the iteration.
    fn fallible(self) -> Fallible<Self>
    where
        Self: Sized,
    {
        Fallible { source: self }
    }
}

/// Iterator adapter yielding `Result`s. A failure is yielded once, then the
/// iterator ends.
pub struct Fallible<S> {
    source: S,
}

impl<S> Fallible<S> {
    pub fn into_inner(self) -> S {
        self.source
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }
}

impl<S: PullSource> Iterator for Fallible<S> {
    type Item = Result<S::Item, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.source.pull() {
            Pull::Item(item) => Some(Ok(item)),
            Pull::Exhausted => None,
            Pull::Failed(e) => Some(Err(e)),
        }
    }
}

/// Default policy: report the failure, remember it, and end the iteration.
pub(crate) fn settle<T>(
    pull: Pull<T>,
    last_error: &mut Option<DatabaseError>,
    scan: &'static str,
) -> Option<T> {
    match pull {
        Pull::Item(item) => Some(item),
        Pull::Exhausted => None,
        Pull::Failed(e) => {
            match e.class() {
                ErrorClass::Connection => warn!(scan, error = %e, "connection failed, no rows streamed"),
                _ => error!(scan, error = %e, "scan failed, stopping early"),
            }
            *last_error = Some(e);
            None
        }
    }
}
