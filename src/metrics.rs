//! Optional observer for intake stages.
//!
//! Nothing is recorded until a recorder is installed with
//! [`set_intake_metrics`]. The HTTP server installs one that forwards to the
//! `metrics` facade; tests install counting fakes.
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use dedup::LookupOutcome;
use ingest::ValidationError;
use store::StoreError;

use crate::{IntakeError, IntakeStage};

/// Metrics observer for intake stages.
pub trait IntakeMetrics: Send + Sync {
    fn record_normalize(&self, latency: Duration, result: Result<(), ValidationError>);
    fn record_lookup(&self, latency: Duration, outcome: LookupOutcome);
    fn record_persist(&self, store: &str, latency: Duration, result: Result<(), StoreError>);
    /// One call per submission, after it reached a terminal state.
    fn record_submission(&self, latency: Duration, forced: bool, result: Result<(), &IntakeError>);

    /// Called with the final stage reached. Defaults to doing nothing.
    fn record_stage(&self, _stage: IntakeStage) {}
}

/// Install or clear the global intake metrics recorder.
pub fn set_intake_metrics(recorder: Option<Arc<dyn IntakeMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn IntakeMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn IntakeMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn IntakeMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Times one stage against the recorder installed when it started.
pub(crate) struct MetricsSpan {
    recorder: Arc<dyn IntakeMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_normalize(self, result: Result<(), ValidationError>) {
        self.recorder.record_normalize(self.start.elapsed(), result);
    }

    pub(crate) fn record_lookup(self, outcome: LookupOutcome) {
        self.recorder.record_lookup(self.start.elapsed(), outcome);
    }

    pub(crate) fn record_persist(self, store: &str, result: Result<(), StoreError>) {
        self.recorder
            .record_persist(store, self.start.elapsed(), result);
    }

    pub(crate) fn record_submission(self, forced: bool, result: Result<(), &IntakeError>) {
        let stage = match result {
            Ok(()) => IntakeStage::Persisted,
            Err(err) => err.stage(),
        };
        self.recorder
            .record_submission(self.start.elapsed(), forced, result);
        self.recorder.record_stage(stage);
    }
}
