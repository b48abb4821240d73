//! The identifying subset of a record that duplicate lookups compare.
use chrono::NaiveDate;
use ingest::{CanonicalRecord, RecordType};
use serde::{Deserialize, Serialize};

/// Fields a stored row must share with a candidate to count as the same
/// logical submission.
///
/// `id` is always compared. The optional components are compared only when
/// present, so the tuple's shape is the duplicate policy.
///
/// ```
/// use store::IdentityTuple;
///
/// let loose = IdentityTuple::new("QR-42").with_block("3");
/// assert_eq!(loose.id(), "QR-42");
/// assert_eq!(loose.block(), Some("3"));
/// assert!(loose.date().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityTuple {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    record_type: Option<RecordType>,
}

impl IdentityTuple {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            block: None,
            date: None,
            record_type: None,
        }
    }

    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into().trim().to_string());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn block(&self) -> Option<&str> {
        self.block.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn record_type(&self) -> Option<RecordType> {
        self.record_type
    }

    /// Does `record` share every component present in this tuple?
    ///
    /// Strings compare trimmed; record types compare as parsed enums, which
    /// makes the comparison case-insensitive on the original labels.
    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        if record.id().trim() != self.id {
            return false;
        }
        if let Some(block) = &self.block {
            if record.block().as_str().trim() != block {
                return false;
            }
        }
        if let Some(date) = self.date {
            if record.date() != date {
                return false;
            }
        }
        if let Some(record_type) = self.record_type {
            if record.record_type() != record_type {
                return false;
            }
        }
        true
    }
}
