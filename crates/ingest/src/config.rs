//! Configuration for the normalizer.
//!
//! [`IngestConfig`] is cheap to clone and deserializes from JSON, TOML or YAML.
//! Every field has a default, so a partial document is enough:
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config: IngestConfig = serde_json::from_str(r#"{ "numeric_block": true }"#).unwrap();
//! assert!(config.numeric_block);
//! assert!(config.strip_control_chars);
//! config.validate().expect("valid config");
//! ```
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for submission normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Bump when normalization behaviour changes in a way stores care about.
    pub version: u32,

    /// Remove control characters from free-text fields before trimming.
    pub strip_control_chars: bool,

    /// Replace a missing identifier with a generated UUIDv4 instead of
    /// rejecting the submission. QR forms always carry an id, so this is off
    /// by default.
    pub generate_missing_id: bool,

    /// Require the block token to read as a number (`3`, `1.1`).
    ///
    /// The orchestrator switches this on when any configured store has a
    /// strictly numeric block column.
    pub numeric_block: bool,

    /// Offset from UTC, in minutes, used to decide which calendar day a
    /// submission belongs to. `0` keeps days in UTC.
    pub utc_offset_minutes: i32,

    /// Upper bound on the length (in characters) of any text field. Unset by
    /// default; the server's body limit already bounds a submission.
    pub max_field_len: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strip_control_chars: true,
            generate_missing_id: false,
            numeric_block: false,
            utc_offset_minutes: 0,
            max_field_len: None,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("utc_offset_minutes ({0}) must be within ±24h")]
    UtcOffsetOutOfRange(i32),

    #[error("max_field_len must be greater than zero")]
    ZeroFieldLength,
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.utc_offset()?;
        if self.max_field_len == Some(0) {
            return Err(ConfigError::ZeroFieldLength);
        }
        Ok(())
    }

    /// The configured offset as a chrono timezone.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::UtcOffsetOutOfRange(self.utc_offset_minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = IngestConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(!cfg.generate_missing_id);
        assert!(!cfg.numeric_block);
        assert_eq!(cfg.utc_offset_minutes, 0);
        assert_eq!(cfg.max_field_len, None);
    }

    #[test]
    fn colombia_offset_is_accepted() {
        let cfg = IngestConfig {
            utc_offset_minutes: -300,
            ..Default::default()
        };
        assert_eq!(cfg.utc_offset().unwrap().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let cfg = IngestConfig {
            utc_offset_minutes: 24 * 60,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::UtcOffsetOutOfRange(24 * 60))
        );
    }

    #[test]
    fn zero_field_length_is_rejected() {
        let cfg = IngestConfig {
            max_field_len: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroFieldLength));
    }
}
