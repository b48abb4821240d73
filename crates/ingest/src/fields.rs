//! Field sanitization shared by the normalizer.
//!
//! Raw form values pass through here before any rule sees them:
//!
//! ```text
//! Option<String>
//!        │  strip control chars (if configured)
//!        │  trim
//!        │  blank → None
//!        │  length limit
//!        ▼
//! Option<String>
//! ```
use crate::config::IngestConfig;
use crate::error::{Field, ValidationError};

/// Cleans an optional field. Blank values collapse to `None`.
pub(crate) fn sanitize_optional(
    field: Field,
    value: Option<String>,
    cfg: &IngestConfig,
) -> Result<Option<String>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let cleaned = if cfg.strip_control_chars {
        strip_control_chars(&value)
    } else {
        value
    };
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if let Some(limit) = cfg.max_field_len {
        if trimmed.chars().count() > limit {
            return Err(ValidationError::FieldTooLong { field, limit });
        }
    }

    Ok(Some(trimmed.to_string()))
}

/// Like [`sanitize_optional`], but absence is an error.
pub(crate) fn sanitize_required(
    field: Field,
    value: Option<String>,
    cfg: &IngestConfig,
) -> Result<String, ValidationError> {
    sanitize_optional(field, value, cfg)?.ok_or(ValidationError::MissingField(field))
}

pub(crate) fn strip_control_chars(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect()
}
