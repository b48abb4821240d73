//! YAML configuration for the intake pipeline.
//!
//! One file describes how submissions are normalized, which identity policy
//! the duplicate guard applies, and which stores receive records, in order.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "finca norte"
//!
//! ingest:
//!   strip_control_chars: true
//!   generate_missing_id: false
//!   utc_offset_minutes: -300
//!
//! identity_policy: exact
//!
//! stores:
//!   - backend: redb
//!     name: ledger
//!     path: /var/lib/harvest/records.redb
//!   - backend: in_memory
//!     name: mirror
//!     numeric_block: true
//! ```
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use dedup::IdentityPolicy;
use ingest::IngestConfig;
use serde::{Deserialize, Serialize};
use store::StoreConfig;
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for an [`IntakeOrchestrator`](crate::IntakeOrchestrator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IntakeConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub identity_policy: IdentityPolicy,

    /// Persistence targets, written in this order. The first one also
    /// answers duplicate lookups.
    #[serde(default = "default_stores")]
    pub stores: Vec<StoreConfig>,
}

impl IntakeConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: IntakeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.ingest
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("ingest: {err}")))?;

        if self.stores.is_empty() {
            return Err(ConfigLoadError::Validation(
                "at least one store must be configured".into(),
            ));
        }

        // Store names identify partial writes, so they must be unique.
        let mut seen = HashSet::new();
        for store in &self.stores {
            if !seen.insert(store.name()) {
                return Err(ConfigLoadError::Validation(format!(
                    "duplicate store name `{}`",
                    store.name()
                )));
            }
        }

        Ok(())
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            ingest: IngestConfig::default(),
            identity_policy: IdentityPolicy::default(),
            stores: default_stores(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_stores() -> Vec<StoreConfig> {
    vec![StoreConfig::in_memory()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "finca norte"
ingest:
  numeric_block: true
  utc_offset_minutes: -300
identity_policy: loose
stores:
  - backend: in_memory
    name: sheet
  - backend: in_memory
    name: table
    numeric_block: true
"#;

        let config = IntakeConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("finca norte"));
        assert!(config.ingest.numeric_block);
        assert!(config.ingest.strip_control_chars);
        assert_eq!(config.ingest.utc_offset_minutes, -300);
        assert_eq!(config.identity_policy, IdentityPolicy::Loose);
        assert_eq!(config.stores.len(), 2);
        assert_eq!(config.stores[1].name(), "table");
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
identity_policy: id_only
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = IntakeConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.identity_policy, IdentityPolicy::IdOnly);
        assert_eq!(config.stores, vec![StoreConfig::in_memory()]);
    }

    #[test]
    fn test_default_config() {
        let config = IntakeConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.identity_policy, IdentityPolicy::Exact);
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = IntakeConfig::from_yaml_str("version: \"2.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn test_rejects_empty_or_duplicate_stores() {
        let err = IntakeConfig::from_yaml_str("stores: []\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));

        let yaml = r#"
stores:
  - backend: in_memory
  - backend: in_memory
"#;
        let err = IntakeConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate store name `memory`"));
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        let yaml = r#"
ingest:
  utc_offset_minutes: 5000
"#;
        let err = IntakeConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn test_unknown_policy_fails_to_parse() {
        let err = IntakeConfig::from_yaml_str("identity_policy: fuzzy\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::YamlParse(_)));
    }
}
