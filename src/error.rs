use ingest::{CanonicalRecord, ValidationError};
use store::StoreError;
use thiserror::Error;

use crate::IntakeStage;

/// Why a submission did not end up persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum IntakeError {
    /// The submission is malformed. Surface the message to the submitter.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A matching record is already stored. `candidate` is what would have
    /// been written, so the client can resubmit it with `force`.
    #[error("record `{}` was already submitted", .candidate.id())]
    Duplicate { candidate: Box<CanonicalRecord> },

    /// `store` failed to append. Stores listed in `persisted_to` already hold
    /// the record; nothing is rolled back. `forced` submissions skipped the
    /// duplicate check.
    #[error("store `{store}` failed to persist the record: {source}")]
    Store {
        store: String,
        persisted_to: Vec<String>,
        forced: bool,
        #[source]
        source: StoreError,
    },

    /// The orchestrator was built from an unusable configuration.
    #[error("invalid intake configuration: {0}")]
    Config(String),
}

impl IntakeError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => "VALIDATION_ERROR",
            IntakeError::Duplicate { .. } => "DUPLICATE",
            IntakeError::Store { .. } => "STORE_ERROR",
            IntakeError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Last stage the submission completed before it stopped.
    pub fn stage(&self) -> IntakeStage {
        match self {
            IntakeError::Validation(_) | IntakeError::Config(_) => IntakeStage::Received,
            IntakeError::Duplicate { .. } => IntakeStage::Normalized,
            IntakeError::Store { forced: true, .. } => IntakeStage::Normalized,
            IntakeError::Store { forced: false, .. } => IntakeStage::DuplicateChecked,
        }
    }

    /// `true` when the submitter can fix the problem themselves.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IntakeError::Validation(_) | IntakeError::Duplicate { .. }
        )
    }
}
