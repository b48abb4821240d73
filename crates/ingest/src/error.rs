//! Error types produced by the ingest crate.
//!
//! Every failure here is a defect in the submitted data. None of them is
//! worth retrying, and all of them can be shown to the submitter verbatim.
//!
//! | Error | Code | Description |
//! |-------|------|-------------|
//! | [`MissingField`](ValidationError::MissingField) | `MISSING_FIELD` | id, variety, block or stem count absent/blank |
//! | [`InvalidStemCount`](ValidationError::InvalidStemCount) | `INVALID_STEM_COUNT` | not a whole number, or below 1 |
//! | [`InvalidBlock`](ValidationError::InvalidBlock) | `INVALID_BLOCK` | a numeric block was required and the token is not one |
//! | [`FieldTooLong`](ValidationError::FieldTooLong) | `FIELD_TOO_LONG` | a text field exceeds `max_field_len`, when one is configured |
//!
//! ```rust
//! use ingest::{Field, ValidationError};
//!
//! let err = ValidationError::MissingField(Field::Variety);
//! assert_eq!(err.to_string(), "missing required field `variety`");
//! assert_eq!(err.code(), "MISSING_FIELD");
//! ```
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Submission fields a validation error can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Variety,
    Block,
    StemCount,
    Stage,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Variety => "variety",
            Field::Block => "block",
            Field::StemCount => "stem_count",
            Field::Stage => "stage",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a raw submission could not become a canonical record.
///
/// `#[non_exhaustive]`: match with a catch-all arm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// A required field is absent or blank after trimming.
    #[error("missing required field `{0}`")]
    MissingField(Field),

    /// The stem count is not a base-10 integer, or is below 1.
    #[error("stem count must be a whole number of at least 1, got `{0}`")]
    InvalidStemCount(String),

    /// A store needs a numeric block and the token cannot be read as one.
    #[error("block `{0}` is not numeric")]
    InvalidBlock(String),

    #[error("field `{field}` is longer than {limit} characters")]
    FieldTooLong { field: Field, limit: usize },
}

impl ValidationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "MISSING_FIELD",
            ValidationError::InvalidStemCount(_) => "INVALID_STEM_COUNT",
            ValidationError::InvalidBlock(_) => "INVALID_BLOCK",
            ValidationError::FieldTooLong { .. } => "FIELD_TOO_LONG",
        }
    }

    /// The field at fault.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::MissingField(field) => *field,
            ValidationError::InvalidStemCount(_) => Field::StemCount,
            ValidationError::InvalidBlock(_) => Field::Block,
            ValidationError::FieldTooLong { field, .. } => *field,
        }
    }
}
