use std::sync::Arc;
use std::time::Instant;

use dedup::{DuplicateGuard, IdentityPolicy};
use ingest::{Clock, IngestConfig, RawSubmission, RecordNormalizer, SizeRulebook};
use serde::Serialize;
use store::{RecordStore, StoredRecord};
use tracing::{error, info, warn, Instrument, Level};

use crate::config::IntakeConfig;
use crate::metrics::MetricsSpan;
use crate::{IntakeError, IntakeStage};

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeReceipt {
    pub record: ingest::CanonicalRecord,
    /// One receipt per store, in configuration order.
    pub stored: Vec<StoredRecord>,
}

impl IntakeReceipt {
    pub fn stage(&self) -> IntakeStage {
        IntakeStage::Persisted
    }

    /// Names of the stores that hold the record.
    pub fn store_names(&self) -> Vec<&str> {
        self.stored.iter().map(|row| row.store.as_str()).collect()
    }
}

/// Drives one submission through normalize, duplicate check and persist.
///
/// Holds no per-submission state, so a single instance can be shared
/// behind an `Arc` by every request handler.
pub struct IntakeOrchestrator {
    normalizer: RecordNormalizer,
    guard: DuplicateGuard,
    stores: Vec<Arc<dyn RecordStore>>,
    lookup: Arc<dyn RecordStore>,
}

impl IntakeOrchestrator {
    /// Wires the pipeline over already-opened stores.
    ///
    /// The first store answers duplicate lookups unless [`with_lookup`]
    /// says otherwise. If any store has a numeric block column, the
    /// normalizer rejects non-numeric blocks up front.
    ///
    /// [`with_lookup`]: IntakeOrchestrator::with_lookup
    pub fn new(
        mut ingest: IngestConfig,
        policy: IdentityPolicy,
        stores: Vec<Arc<dyn RecordStore>>,
    ) -> Result<Self, IntakeError> {
        let Some(lookup) = stores.first().cloned() else {
            return Err(IntakeError::Config("at least one store is required".into()));
        };

        if stores.iter().any(|store| store.requires_numeric_block()) {
            ingest.numeric_block = true;
        }
        let normalizer =
            RecordNormalizer::new(ingest).map_err(|err| IntakeError::Config(err.to_string()))?;

        Ok(Self {
            normalizer,
            guard: DuplicateGuard::new(policy),
            stores,
            lookup,
        })
    }

    /// Opens every configured store and wires the pipeline over them.
    pub fn from_config(config: &IntakeConfig) -> Result<Self, IntakeError> {
        let stores = config
            .stores
            .iter()
            .map(|store| {
                store.build().map_err(|err| {
                    IntakeError::Config(format!("store `{}`: {err}", store.name()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(config.ingest.clone(), config.identity_policy, stores)
    }

    /// Answer duplicate lookups from `lookup` instead of the first store.
    pub fn with_lookup(mut self, lookup: Arc<dyn RecordStore>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.normalizer = self.normalizer.with_clock(clock);
        self
    }

    pub fn with_rules(mut self, rules: SizeRulebook) -> Self {
        self.normalizer = self.normalizer.with_rules(rules);
        self
    }

    pub fn normalizer(&self) -> &RecordNormalizer {
        &self.normalizer
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.guard.policy()
    }

    pub fn store_names(&self) -> Vec<&str> {
        self.stores.iter().map(|store| store.name()).collect()
    }

    /// Runs one submission to a terminal state.
    ///
    /// With `force` the duplicate check is skipped entirely. Stores are
    /// written one after another; a failure part way through is reported
    /// with the stores that already hold the record.
    pub async fn submit(
        &self,
        raw: RawSubmission,
        force: bool,
    ) -> Result<IntakeReceipt, IntakeError> {
        let span = tracing::span!(
            Level::INFO,
            "harvest.submit",
            record_id = ?raw.id,
            force
        );
        self.submit_inner(raw, force).instrument(span).await
    }

    async fn submit_inner(
        &self,
        raw: RawSubmission,
        force: bool,
    ) -> Result<IntakeReceipt, IntakeError> {
        let start = Instant::now();
        let submission_metrics = MetricsSpan::start();

        let result = self.run_stages(raw, force).await;

        let elapsed_micros = start.elapsed().as_micros();
        match &result {
            Ok(receipt) => info!(
                record_id = %receipt.record.id(),
                stores = ?receipt.store_names(),
                forced = force,
                elapsed_micros,
                "intake_success"
            ),
            Err(err @ IntakeError::Store { .. }) => error!(
                error = %err,
                code = err.code(),
                stage = %err.stage(),
                elapsed_micros,
                "intake_failure"
            ),
            Err(err) => warn!(
                error = %err,
                code = err.code(),
                stage = %err.stage(),
                elapsed_micros,
                "intake_failure"
            ),
        }
        if let Some(span) = submission_metrics {
            span.record_submission(force, result.as_ref().map(|_| ()));
        }
        result
    }

    async fn run_stages(
        &self,
        raw: RawSubmission,
        force: bool,
    ) -> Result<IntakeReceipt, IntakeError> {
        let normalize_metrics = MetricsSpan::start();
        let record = match self.normalizer.normalize(raw) {
            Ok(record) => {
                if let Some(span) = normalize_metrics {
                    span.record_normalize(Ok(()));
                }
                record
            }
            Err(err) => {
                if let Some(span) = normalize_metrics {
                    span.record_normalize(Err(err.clone()));
                }
                return Err(IntakeError::Validation(err));
            }
        };

        if !force {
            let lookup_metrics = MetricsSpan::start();
            let outcome = self.guard.check(&record, self.lookup.as_ref()).await;
            if let Some(span) = lookup_metrics {
                span.record_lookup(outcome);
            }
            if outcome.is_duplicate() {
                return Err(IntakeError::Duplicate {
                    candidate: Box::new(record),
                });
            }
        }

        let mut stored = Vec::with_capacity(self.stores.len());
        for store in &self.stores {
            let persist_metrics = MetricsSpan::start();
            match store.append(&record).await {
                Ok(row) => {
                    if let Some(span) = persist_metrics {
                        span.record_persist(store.name(), Ok(()));
                    }
                    stored.push(row);
                }
                Err(source) => {
                    if let Some(span) = persist_metrics {
                        span.record_persist(store.name(), Err(source.clone()));
                    }
                    return Err(IntakeError::Store {
                        store: store.name().to_string(),
                        persisted_to: stored.iter().map(|row| row.store.clone()).collect(),
                        forced: force,
                        source,
                    });
                }
            }
        }

        Ok(IntakeReceipt { record, stored })
    }
}

impl std::fmt::Debug for IntakeOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeOrchestrator")
            .field("normalizer", &self.normalizer)
            .field("policy", &self.guard.policy())
            .field("stores", &self.store_names())
            .field("lookup", &self.lookup.name())
            .finish()
    }
}
