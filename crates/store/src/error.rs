use thiserror::Error;

/// Infrastructure faults raised by a record store.
///
/// These are never the submitter's fault. Callers log the full error and show
/// the submitter a generic failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// The underlying database or service failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// A row could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store's schema refused the record (e.g. a non-numeric block in a
    /// numeric column).
    #[error("schema violation: {0}")]
    Schema(String),

    /// The store is not reachable right now.
    #[error("store unavailable")]
    Unavailable,
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
