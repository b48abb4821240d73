//! # Harvest record stores
//!
//! Durable, append-only homes for [`CanonicalRecord`]s.
//!
//! ## Core Features
//!
//! - **One capability**: every store implements [`RecordStore`]: `append`
//!   a record, or ask whether a row matching an [`IdentityTuple`] `exists`.
//!   No updates, no deletes.
//! - **Pluggable backends**: an in-memory store for tests and ephemeral runs,
//!   and a redb store for durable on-disk storage (feature `redb`, on by
//!   default). [`StoreConfig`] builds either from configuration.
//! - **Schema flags**: a store can declare that its block column is strictly
//!   numeric, so the orchestrator can reject non-numeric blocks before any
//!   store is touched.
//!
//! ## Example Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use ingest::{normalize, FixedClock, IngestConfig, RawSubmission};
//! use store::{IdentityTuple, InMemoryStore, RecordStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let raw = RawSubmission {
//!     id: Some("QR-7".into()),
//!     variety: Some("hilux".into()),
//!     stem_count: Some("12".into()),
//!     block: Some("4".into()),
//!     ..Default::default()
//! };
//! let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
//! let record = normalize(raw, &IngestConfig::default(), &clock).unwrap();
//!
//! let store = InMemoryStore::new("memory");
//! let stored = store.append(&record).await.unwrap();
//! assert_eq!(stored.sequence, 1);
//!
//! let identity = IdentityTuple::new("QR-7").with_block("4");
//! assert!(store.exists(&identity).await.unwrap());
//! # }
//! ```
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest::CanonicalRecord;
use serde::{Deserialize, Serialize};

mod config;
mod error;
mod identity;
mod memory;

#[cfg(feature = "redb")]
mod redb;

pub use crate::config::StoreConfig;
pub use crate::error::StoreError;
pub use crate::identity::IdentityTuple;
pub use crate::memory::InMemoryStore;

#[cfg(feature = "redb")]
pub use crate::redb::RedbStore;

/// A durable, append-only destination for canonical records.
///
/// Implementations must be shareable across tasks. `append` and `exists` are
/// the only suspension points of an intake; neither is retried by callers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name used in logs and error reports.
    fn name(&self) -> &str;

    /// `true` when the store's block column only accepts numbers.
    fn requires_numeric_block(&self) -> bool {
        false
    }

    /// Durably persists one record.
    async fn append(&self, record: &CanonicalRecord) -> Result<StoredRecord, StoreError>;

    /// Whether any stored row matches every component of `identity`.
    async fn exists(&self, identity: &IdentityTuple) -> Result<bool, StoreError>;
}

/// Receipt for one appended record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Position in the store, starting at 1.
    pub sequence: u64,
    pub stored_at: DateTime<Utc>,
    /// [`RecordStore::name`] of the store that wrote it.
    pub store: String,
    pub record: CanonicalRecord,
}

/// Rejects a record whose block the numeric schema cannot hold.
pub(crate) fn check_numeric_block(
    numeric_block: bool,
    record: &CanonicalRecord,
) -> Result<(), StoreError> {
    if numeric_block && record.block().as_number().is_none() {
        return Err(StoreError::Schema(format!(
            "block `{}` is not numeric",
            record.block()
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;
    use ingest::{normalize, CanonicalRecord, FixedClock, IngestConfig, RawSubmission};

    pub(crate) fn day() -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(2024, 5, 1) else {
            panic!("invalid date components");
        };
        date
    }

    pub(crate) fn record(id: &str, block: &str, record_type: &str) -> CanonicalRecord {
        let raw = RawSubmission {
            id: Some(id.into()),
            variety: Some("freedom".into()),
            size: Some("corto".into()),
            stem_count: Some("30".into()),
            block: Some(block.into()),
            record_type: Some(record_type.into()),
            ..Default::default()
        };
        match normalize(raw, &IngestConfig::default(), &FixedClock(day())) {
            Ok(record) => record,
            Err(err) => panic!("fixture record failed to normalize: {err}"),
        }
    }
}
