use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[cfg(feature = "redb")]
use crate::RedbStore;
use crate::{InMemoryStore, RecordStore, StoreError};

/// Selects and configures one record store.
///
/// ```
/// use store::StoreConfig;
///
/// let config: StoreConfig =
///     serde_json::from_str(r#"{"backend":"redb","name":"ledger","path":"/data/harvest.redb"}"#)
///         .unwrap();
/// assert_eq!(config.name(), "ledger");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Keep rows in process memory. Lost on restart.
    InMemory {
        #[serde(default = "default_memory_name")]
        name: String,
        #[serde(default)]
        numeric_block: bool,
    },
    /// Durable redb file at `path`.
    ///
    /// Requires the `redb` feature (enabled by default).
    Redb {
        #[serde(default = "default_redb_name")]
        name: String,
        path: String,
        #[serde(default)]
        numeric_block: bool,
    },
}

fn default_memory_name() -> String {
    "memory".to_string()
}

fn default_redb_name() -> String {
    "redb".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::in_memory()
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        StoreConfig::InMemory {
            name: default_memory_name(),
            numeric_block: false,
        }
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        StoreConfig::Redb {
            name: default_redb_name(),
            path: path.into(),
            numeric_block: false,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StoreConfig::InMemory { name, .. } | StoreConfig::Redb { name, .. } => name,
        }
    }

    /// Open the configured store.
    pub fn build(&self) -> Result<Arc<dyn RecordStore>, StoreError> {
        match self {
            StoreConfig::InMemory {
                name,
                numeric_block,
            } => Ok(Arc::new(
                InMemoryStore::new(name.clone()).with_numeric_block(*numeric_block),
            )),
            StoreConfig::Redb {
                name,
                path,
                numeric_block,
            } => {
                #[cfg(feature = "redb")]
                {
                    Ok(Arc::new(
                        RedbStore::open(name.clone(), path)?.with_numeric_block(*numeric_block),
                    ))
                }
                #[cfg(not(feature = "redb"))]
                {
                    let _ = (name, path, numeric_block);
                    Err(StoreError::backend("redb store disabled at compile time"))
                }
            }
        }
    }
}
