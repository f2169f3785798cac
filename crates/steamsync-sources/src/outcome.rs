//! Tri-state fetch result.
//!
//! Source clients return `Result<FetchOutcome<T>, SourceError>`: `Err` for
//! genuine failures, `Ok(NoData)` when the upstream legitimately has nothing
//! to report for an entity (removed, private, empty), `Ok(Data)` otherwise.

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Data(T),
    NoData(String),
}

impl<T> FetchOutcome<T> {
    pub fn no_data(reason: impl Into<String>) -> Self {
        FetchOutcome::NoData(reason.into())
    }

    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(self, FetchOutcome::Data(_))
    }

    /// Converts to an `Option`, dropping the no-data reason.
    pub fn data(self) -> Option<T> {
        match self {
            FetchOutcome::Data(value) => Some(value),
            FetchOutcome::NoData(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Data(value) => FetchOutcome::Data(f(value)),
            FetchOutcome::NoData(reason) => FetchOutcome::NoData(reason),
        }
    }
}
