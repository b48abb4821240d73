//! Prometheus wiring for intake metrics.
use harvest::{IntakeError, IntakeMetrics, IntakeStage, LookupOutcome, StoreError, ValidationError};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Forwards intake observations to the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusIntakeMetrics;

impl IntakeMetrics for PrometheusIntakeMetrics {
    fn record_normalize(&self, latency: Duration, result: Result<(), ValidationError>) {
        let outcome = match &result {
            Ok(()) => "ok",
            Err(err) => err.code(),
        };
        metrics::histogram!("harvest_normalize_seconds").record(latency.as_secs_f64());
        metrics::counter!("harvest_normalize_total", "outcome" => outcome).increment(1);
    }

    fn record_lookup(&self, latency: Duration, outcome: LookupOutcome) {
        metrics::histogram!("harvest_lookup_seconds").record(latency.as_secs_f64());
        metrics::counter!("harvest_lookup_total", "outcome" => outcome.as_str()).increment(1);
    }

    fn record_persist(&self, store: &str, latency: Duration, result: Result<(), StoreError>) {
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::histogram!("harvest_persist_seconds", "store" => store.to_string())
            .record(latency.as_secs_f64());
        metrics::counter!(
            "harvest_persist_total",
            "store" => store.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }

    fn record_submission(&self, latency: Duration, forced: bool, result: Result<(), &IntakeError>) {
        let outcome = match result {
            Ok(()) => "persisted",
            Err(err) => err.code(),
        };
        metrics::histogram!("harvest_submission_seconds").record(latency.as_secs_f64());
        metrics::counter!(
            "harvest_submissions_total",
            "outcome" => outcome,
            "forced" => if forced { "true" } else { "false" }
        )
        .increment(1);
    }

    fn record_stage(&self, stage: IntakeStage) {
        metrics::counter!("harvest_submission_stage_total", "stage" => stage.as_str()).increment(1);
    }
}

/// Installs the process-wide Prometheus recorder.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}
