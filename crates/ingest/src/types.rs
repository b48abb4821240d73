//! Core data model types for the ingest crate.
//!
//! ```text
//! RawSubmission (strings straight off the form)
//! ├── id, variety, size, stem_count, stage, block, record_type, force
//!
//!         ↓ normalize()
//!
//! CanonicalRecord (validated, immutable)
//! ├── id: String
//! ├── date: NaiveDate
//! ├── block: BlockCode        literal trimmed token
//! ├── variety: String
//! ├── stem_count: StemCount   ≥ 1
//! ├── stage: String           "" when absent
//! ├── record_type: RecordType
//! └── size: Option<SizeCode>  never for national, never `na`
//! ```
use std::fmt;
use std::num::NonZeroU32;

use chrono::NaiveDate;
use rulebook::SizeCode;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// A submission exactly as the form or QR link sent it.
///
/// Every field is optional at this level; the normalizer decides what is
/// required. The original Spanish form field names are accepted as aliases,
/// and numeric JSON values are accepted wherever a number-looking string is
/// expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSubmission {
    #[serde(alias = "identifier", deserialize_with = "lenient_string")]
    pub id: Option<String>,

    #[serde(alias = "variedad")]
    pub variety: Option<String>,

    #[serde(alias = "tamano", alias = "size_code")]
    pub size: Option<String>,

    #[serde(alias = "numero_tallos", deserialize_with = "lenient_string")]
    pub stem_count: Option<String>,

    #[serde(alias = "etapa")]
    pub stage: Option<String>,

    #[serde(alias = "bloque", deserialize_with = "lenient_string")]
    pub block: Option<String>,

    #[serde(alias = "tipo")]
    pub record_type: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub force: Option<String>,
}

impl RawSubmission {
    /// Whether the submitter explicitly asked to bypass the duplicate check.
    pub fn force_requested(&self) -> bool {
        parse_force_flag(self.force.as_deref())
    }
}

/// `"true"` and `"1"` (any case, trimmed) mean force; everything else does not.
pub fn parse_force_flag(raw: Option<&str>) -> bool {
    match raw.map(|s| s.trim().to_ascii_lowercase()) {
        Some(flag) => flag == "true" || flag == "1",
        None => false,
    }
}

/// Accepts a JSON string, number or bool and keeps its text form.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Which harvest form produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// Stems for the national market. Never carries a size.
    National,
    /// End-of-cut tally. Size rules apply.
    EndOfCut,
}

impl RecordType {
    /// Recognises `national` / `nacional` and `end_of_cut` / `end-of-cut` /
    /// `fin_corte`, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<RecordType> {
        match label.trim().to_lowercase().as_str() {
            "national" | "nacional" => Some(RecordType::National),
            "end_of_cut" | "end-of-cut" | "fin_corte" | "fin-corte" => Some(RecordType::EndOfCut),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::National => "national",
            RecordType::EndOfCut => "end_of_cut",
        }
    }

    pub fn is_national(self) -> bool {
        matches!(self, RecordType::National)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cultivation block as submitted (trimmed), e.g. `"3"` or `"1.1"`.
///
/// The literal token is the identity key. [`BlockCode::as_number`] derives the
/// numeric form for stores whose schema needs one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockCode(String);

impl BlockCode {
    pub fn new(token: impl Into<String>) -> Self {
        BlockCode(token.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for plain decimals: digits, optionally one `.` between digits.
    pub fn is_numeric(&self) -> bool {
        let mut parts = self.0.splitn(2, '.');
        let whole = parts.next().unwrap_or_default();
        let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        match parts.next() {
            Some(fraction) => digits(whole) && digits(fraction),
            None => digits(whole),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        if self.is_numeric() {
            self.0.parse().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for BlockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of stems in a tally. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StemCount(NonZeroU32);

impl StemCount {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(StemCount)
    }

    /// Parses a trimmed base-10 integer. Trailing junk, fractions, zero and
    /// negatives are all rejected.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidStemCount(raw.trim().to_string());
        let value: i64 = raw.trim().parse().map_err(|_| invalid())?;
        u32::try_from(value)
            .ok()
            .and_then(StemCount::new)
            .ok_or_else(invalid)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for StemCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated harvest record, ready for persistence.
///
/// Only the normalizer builds these, and nothing mutates them afterwards.
/// Deserialization re-checks the size invariants so a record read back from
/// a store is as trustworthy as a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordRepr")]
pub struct CanonicalRecord {
    id: String,
    date: NaiveDate,
    block: BlockCode,
    variety: String,
    stem_count: StemCount,
    stage: String,
    record_type: RecordType,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<SizeCode>,
}

impl CanonicalRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: String,
        date: NaiveDate,
        block: BlockCode,
        variety: String,
        stem_count: StemCount,
        stage: String,
        record_type: RecordType,
        size: Option<SizeCode>,
    ) -> Self {
        let size = match record_type {
            RecordType::National => None,
            RecordType::EndOfCut => size.filter(|code| !code.is_pseudo()),
        };
        Self {
            id,
            date,
            block,
            variety,
            stem_count,
            stage,
            record_type,
            size,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn block(&self) -> &BlockCode {
        &self.block
    }

    pub fn variety(&self) -> &str {
        &self.variety
    }

    pub fn stem_count(&self) -> StemCount {
        self.stem_count
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn size(&self) -> Option<SizeCode> {
        self.size
    }
}

#[derive(Deserialize)]
struct RecordRepr {
    id: String,
    date: NaiveDate,
    block: BlockCode,
    variety: String,
    stem_count: StemCount,
    #[serde(default)]
    stage: String,
    record_type: RecordType,
    #[serde(default)]
    size: Option<SizeCode>,
}

impl TryFrom<RecordRepr> for CanonicalRecord {
    type Error = String;

    fn try_from(repr: RecordRepr) -> Result<Self, Self::Error> {
        if repr.id.trim().is_empty() {
            return Err("record id is empty".into());
        }
        match (repr.record_type, repr.size) {
            (RecordType::National, Some(size)) => {
                return Err(format!("national record carries size `{size}`"));
            }
            (_, Some(SizeCode::NotApplicable)) => {
                return Err("`na` is not a storable size".into());
            }
            _ => {}
        }
        Ok(CanonicalRecord {
            id: repr.id,
            date: repr.date,
            block: repr.block,
            variety: repr.variety,
            stem_count: repr.stem_count,
            stage: repr.stage,
            record_type: repr.record_type,
            size: repr.size,
        })
    }
}
