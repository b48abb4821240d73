use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use ingest::CanonicalRecord;

use crate::{check_numeric_block, IdentityTuple, RecordStore, StoreError, StoredRecord};

/// An in-memory store using a `RwLock` around a `Vec`. Useful for tests.
pub struct InMemoryStore {
    name: String,
    numeric_block: bool,
    rows: RwLock<Vec<StoredRecord>>,
}

impl InMemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            numeric_block: false,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Pretend the block column is numeric, like a relational table would be.
    pub fn with_numeric_block(mut self, numeric_block: bool) -> Self {
        self.numeric_block = numeric_block;
        self
    }

    /// Snapshot of every stored row, in append order.
    pub fn rows(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let guard = self
            .rows
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.clone())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_numeric_block(&self) -> bool {
        self.numeric_block
    }

    async fn append(&self, record: &CanonicalRecord) -> Result<StoredRecord, StoreError> {
        check_numeric_block(self.numeric_block, record)?;

        // The write lock is held for sequence assignment and the push.
        let mut guard = self
            .rows
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let stored = StoredRecord {
            sequence: guard.len() as u64 + 1,
            stored_at: Utc::now(),
            store: self.name.clone(),
            record: record.clone(),
        };
        guard.push(stored.clone());
        Ok(stored)
    }

    async fn exists(&self, identity: &IdentityTuple) -> Result<bool, StoreError> {
        let guard = self
            .rows
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.iter().any(|row| identity.matches(&row.record)))
    }
}
