//! Workspace umbrella crate for harvest intake.
//!
//! This crate stitches normalization, duplicate detection and persistence
//! into one entry point, [`IntakeOrchestrator::submit`]:
//!
//! ```text
//! Received ──normalize──▶ Normalized ──duplicate check──▶ DuplicateChecked ──append──▶ Persisted
//!     │                        │                                │
//!     ▼                        ▼                                ▼
//! Validation               Duplicate                          Store
//! ```
//!
//! `force` skips the duplicate check. Store writes happen in configuration
//! order and are never rolled back.
//!
//! ```
//! use std::sync::Arc;
//! use harvest::{IdentityPolicy, IngestConfig, IntakeError, IntakeOrchestrator, RawSubmission};
//! use store::{InMemoryStore, RecordStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new("memory"));
//! let intake =
//!     IntakeOrchestrator::new(IngestConfig::default(), IdentityPolicy::Exact, vec![store]).unwrap();
//!
//! let raw = RawSubmission {
//!     id: Some("QR-42".into()),
//!     variety: Some("freedom".into()),
//!     size: Some("largo".into()),
//!     stem_count: Some("30".into()),
//!     block: Some("3".into()),
//!     record_type: Some("end_of_cut".into()),
//!     ..Default::default()
//! };
//!
//! let receipt = intake.submit(raw.clone(), false).await.unwrap();
//! assert_eq!(receipt.record.id(), "QR-42");
//!
//! let again = intake.submit(raw, false).await;
//! assert!(matches!(again, Err(IntakeError::Duplicate { .. })));
//! # }
//! ```

pub use dedup::{DuplicateGuard, IdentityPolicy, LookupOutcome};
pub use ingest::{
    BlockCode, CanonicalRecord, Clock, Field, FixedClock, IngestConfig, RawSubmission,
    RecordNormalizer, RecordType, SizeCode, SizeRulebook, StemCount, SystemClock,
    ValidationError, parse_force_flag,
};
pub use store::{IdentityTuple, RecordStore, StoreConfig, StoreError, StoredRecord};

mod config;
mod error;
mod metrics;
mod orchestrator;

pub use crate::config::{ConfigLoadError, IntakeConfig};
pub use crate::error::IntakeError;
pub use crate::metrics::{IntakeMetrics, set_intake_metrics};
pub use crate::orchestrator::{IntakeOrchestrator, IntakeReceipt};

use serde::Serialize;
use std::fmt;

/// How far a submission got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStage {
    Received,
    Normalized,
    DuplicateChecked,
    Persisted,
}

impl IntakeStage {
    pub fn as_str(self) -> &'static str {
        match self {
            IntakeStage::Received => "received",
            IntakeStage::Normalized => "normalized",
            IntakeStage::DuplicateChecked => "duplicate_checked",
            IntakeStage::Persisted => "persisted",
        }
    }
}

impl fmt::Display for IntakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::{Arc, RwLock};
    use std::time::Duration;
    use store::InMemoryStore;

    fn raw(id: &str) -> RawSubmission {
        RawSubmission {
            id: Some(id.into()),
            variety: Some("vendela".into()),
            size: Some("ruso".into()),
            stem_count: Some("40".into()),
            block: Some("1".into()),
            record_type: Some("fin_corte".into()),
            ..Default::default()
        }
    }

    fn orchestrator() -> IntakeOrchestrator {
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::default());
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        IntakeOrchestrator::new(IngestConfig::default(), IdentityPolicy::Exact, vec![store])
            .unwrap()
            .with_clock(Arc::new(FixedClock(day)))
    }

    #[derive(Default)]
    struct CountingMetrics {
        events: Arc<RwLock<Vec<String>>>,
    }

    impl CountingMetrics {
        fn snapshot(&self) -> Vec<String> {
            self.events.read().unwrap().clone()
        }
    }

    impl IntakeMetrics for CountingMetrics {
        fn record_normalize(&self, _latency: Duration, result: Result<(), ValidationError>) {
            let label = if result.is_ok() {
                "normalize_ok"
            } else {
                "normalize_err"
            };
            self.events.write().unwrap().push(label.into());
        }

        fn record_lookup(&self, _latency: Duration, outcome: LookupOutcome) {
            self.events
                .write()
                .unwrap()
                .push(format!("lookup_{}", outcome.as_str()));
        }

        fn record_persist(&self, store: &str, _latency: Duration, result: Result<(), StoreError>) {
            let label = if result.is_ok() { "ok" } else { "err" };
            self.events
                .write()
                .unwrap()
                .push(format!("persist_{store}_{label}"));
        }

        fn record_submission(
            &self,
            _latency: Duration,
            forced: bool,
            result: Result<(), &IntakeError>,
        ) {
            let label = match result {
                Ok(()) => "ok",
                Err(err) => err.code(),
            };
            self.events
                .write()
                .unwrap()
                .push(format!("submission_{label}_forced_{forced}"));
        }

        fn record_stage(&self, stage: IntakeStage) {
            self.events.write().unwrap().push(format!("stage_{stage}"));
        }
    }

    // The only test in this binary that submits, so no other test can
    // interleave events while the global recorder is installed.
    #[tokio::test]
    async fn metrics_observe_every_stage() {
        let metrics = Arc::new(CountingMetrics::default());
        set_intake_metrics(Some(metrics.clone()));

        let intake = orchestrator();
        intake.submit(raw("QR-1"), false).await.unwrap();
        let duplicate = intake.submit(raw("QR-1"), false).await;
        assert!(matches!(duplicate, Err(IntakeError::Duplicate { .. })));
        intake.submit(raw("QR-1"), true).await.unwrap();

        set_intake_metrics(None);

        assert_eq!(
            metrics.snapshot(),
            vec![
                "normalize_ok",
                "lookup_unique",
                "persist_memory_ok",
                "submission_ok_forced_false",
                "stage_persisted",
                "normalize_ok",
                "lookup_duplicate",
                "submission_DUPLICATE_forced_false",
                "stage_normalized",
                "normalize_ok",
                "persist_memory_ok",
                "submission_ok_forced_true",
                "stage_persisted",
            ]
        );
    }

    #[test]
    fn stage_labels_are_snake_case() {
        assert_eq!(IntakeStage::DuplicateChecked.to_string(), "duplicate_checked");
        assert_eq!(
            serde_json::to_string(&IntakeStage::Persisted).unwrap(),
            "\"persisted\""
        );
    }
}
