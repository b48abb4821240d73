//! # Harvest duplicate guard (`dedup`)
//!
//! Decides whether a normalized [`ingest::CanonicalRecord`] was already
//! stored, by asking a [`store::RecordStore`] whether a row with the same
//! identity exists.
//!
//! ## Core Types
//!
//! - [`IdentityPolicy`]: which fields define "the same submission":
//!   - `Exact`: id, block, date and record type.
//!   - `Loose`: id and block.
//!   - `IdOnly`: id alone.
//! - [`DuplicateGuard`]: runs the lookup under a policy.
//! - [`LookupOutcome`]: what the lookup found, including failed lookups.
//!
//! A failed lookup is never a duplicate. The guard logs it at `warn` and lets
//! the submission through.
//!
//! ## Example Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use dedup::{DuplicateGuard, IdentityPolicy};
//! use ingest::{normalize, FixedClock, IngestConfig, RawSubmission};
//! use store::{InMemoryStore, RecordStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let raw = RawSubmission {
//!     id: Some("QR-42".into()),
//!     variety: Some("freedom".into()),
//!     stem_count: Some("30".into()),
//!     block: Some("3".into()),
//!     ..Default::default()
//! };
//! let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
//! let record = normalize(raw, &IngestConfig::default(), &clock).unwrap();
//!
//! let store = InMemoryStore::default();
//! let guard = DuplicateGuard::new(IdentityPolicy::Exact);
//! assert!(!guard.is_duplicate(&record, &store).await);
//!
//! store.append(&record).await.unwrap();
//! assert!(guard.is_duplicate(&record, &store).await);
//! # }
//! ```
mod guard;
mod policy;

pub use crate::guard::{DuplicateGuard, LookupOutcome};
pub use crate::policy::IdentityPolicy;
