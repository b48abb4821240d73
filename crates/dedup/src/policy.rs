use ingest::CanonicalRecord;
use serde::{Deserialize, Serialize};
use store::IdentityTuple;

/// Which fields make two submissions "the same".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// Same id, block, date and record type.
    #[default]
    Exact,
    /// Same id and block. Suited to stores that can only look up two columns.
    Loose,
    /// Same id only.
    IdOnly,
}

impl IdentityPolicy {
    /// The lookup key for `record` under this policy.
    pub fn identity_of(self, record: &CanonicalRecord) -> IdentityTuple {
        let tuple = IdentityTuple::new(record.id());
        match self {
            IdentityPolicy::IdOnly => tuple,
            IdentityPolicy::Loose => tuple.with_block(record.block().as_str()),
            IdentityPolicy::Exact => tuple
                .with_block(record.block().as_str())
                .with_date(record.date())
                .with_record_type(record.record_type()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IdentityPolicy::Exact => "exact",
            IdentityPolicy::Loose => "loose",
            IdentityPolicy::IdOnly => "id_only",
        }
    }
}

impl std::fmt::Display for IdentityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
