use ingest::CanonicalRecord;
use store::RecordStore;
use tracing::{debug, warn};

use crate::IdentityPolicy;


/// What a duplicate lookup found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// No stored row shares the candidate's identity.
    Unique,
    /// At least one stored row shares the candidate's identity.
    Duplicate,
    /// The store could not answer. Treated as [`LookupOutcome::Unique`].
    LookupFailed,
}

impl LookupOutcome {
    pub fn is_duplicate(self) -> bool {
        matches!(self, LookupOutcome::Duplicate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LookupOutcome::Unique => "unique",
            LookupOutcome::Duplicate => "duplicate",
            LookupOutcome::LookupFailed => "lookup_failed",
        }
    }
}

/// Decides whether a candidate record was already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateGuard {
    policy: IdentityPolicy,
}

impl DuplicateGuard {
    pub fn new(policy: IdentityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    /// Looks the candidate's identity up in `lookup`.
    ///
    /// Lookup errors never reject a submission: they are logged at `warn`
    /// and reported as [`LookupOutcome::LookupFailed`].
    pub async fn check(
        &self,
        candidate: &CanonicalRecord,
        lookup: &dyn RecordStore,
    ) -> LookupOutcome {
        let identity = self.policy.identity_of(candidate);
        match lookup.exists(&identity).await {
            Ok(true) => {
                debug!(
                    record_id = %candidate.id(),
                    policy = %self.policy,
                    store = lookup.name(),
                    "duplicate found"
                );
                LookupOutcome::Duplicate
            }
            Ok(false) => LookupOutcome::Unique,
            Err(err) => {
                warn!(
                    record_id = %candidate.id(),
                    store = lookup.name(),
                    error = %err,
                    "duplicate lookup failed, accepting submission"
                );
                LookupOutcome::LookupFailed
            }
        }
    }

    /// `true` only when the lookup positively reports a matching row.
    pub async fn is_duplicate(
        &self,
        candidate: &CanonicalRecord,
        lookup: &dyn RecordStore,
    ) -> bool {
        self.check(candidate, lookup).await.is_duplicate()
    }
}
