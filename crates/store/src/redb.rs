//! Redb (Rust embedded database) record store.
//!
//! Rows live in a single table keyed by a monotonically increasing sequence
//! number. Each value is the JSON form of a [`StoredRecord`], so a file can be
//! inspected with nothing more than redb and serde_json.
//!
//! # Configuration Example
//! ```yaml
//! stores:
//!   - backend: redb
//!     name: ledger
//!     path: /var/lib/harvest/records.redb
//! ```
//!
//! redb transactions are blocking, so every call runs on tokio's blocking
//! pool. redb serialises write transactions itself, which keeps sequence
//! assignment race free across concurrent appends.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ingest::CanonicalRecord;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::debug;

use crate::{check_numeric_block, IdentityTuple, RecordStore, StoreError, StoredRecord};

const RECORDS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("harvest_records");

fn backend_err(err: impl std::fmt::Display) -> StoreError {
    StoreError::backend(err.to_string())
}

/// Durable append-only store backed by a redb file.
///
/// Cloning is cheap; clones share the same database handle.
#[derive(Clone)]
pub struct RedbStore {
    name: String,
    numeric_block: bool,
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at `path` and make sure the table exists.
    pub fn open<P: AsRef<Path>>(name: impl Into<String>, path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(backend_err)?;

        let write_txn = db.begin_write().map_err(backend_err)?;
        {
            // Opening the table inside a write transaction creates it.
            let _table = write_txn.open_table(RECORDS_TABLE).map_err(backend_err)?;
        }
        write_txn.commit().map_err(backend_err)?;

        Ok(Self {
            name: name.into(),
            numeric_block: false,
            db: Arc::new(db),
        })
    }

    pub fn with_numeric_block(mut self, numeric_block: bool) -> Self {
        self.numeric_block = numeric_block;
        self
    }

    /// Every stored row in sequence order.
    pub fn rows(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let mut rows = Vec::new();
        self.scan(&mut |row| {
            rows.push(row);
            Ok(true)
        })?;
        Ok(rows)
    }

    /// Visits rows in sequence order until `visitor` returns `false`.
    fn scan(
        &self,
        visitor: &mut dyn FnMut(StoredRecord) -> Result<bool, StoreError>,
    ) -> Result<(), StoreError> {
        let read_txn = self.db.begin_read().map_err(backend_err)?;
        let table = read_txn.open_table(RECORDS_TABLE).map_err(backend_err)?;

        for item in table.iter().map_err(backend_err)? {
            let (_, value) = item.map_err(backend_err)?;
            let row: StoredRecord = serde_json::from_slice(value.value())?;
            if !visitor(row)? {
                break;
            }
        }
        Ok(())
    }

    fn append_blocking(&self, record: CanonicalRecord) -> Result<StoredRecord, StoreError> {
        let write_txn = self.db.begin_write().map_err(backend_err)?;
        let stored = {
            let mut table = write_txn.open_table(RECORDS_TABLE).map_err(backend_err)?;
            let sequence = match table.last().map_err(backend_err)? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            let stored = StoredRecord {
                sequence,
                stored_at: Utc::now(),
                store: self.name.clone(),
                record,
            };
            let bytes = serde_json::to_vec(&stored)?;
            table
                .insert(sequence, bytes.as_slice())
                .map_err(backend_err)?;
            stored
        };
        write_txn.commit().map_err(backend_err)?;

        debug!(store = %self.name, sequence = stored.sequence, "record appended");
        Ok(stored)
    }

    fn exists_blocking(&self, identity: &IdentityTuple) -> Result<bool, StoreError> {
        let mut found = false;
        self.scan(&mut |row| {
            found = identity.matches(&row.record);
            Ok(!found)
        })?;
        Ok(found)
    }
}

#[async_trait]
impl RecordStore for RedbStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_numeric_block(&self) -> bool {
        self.numeric_block
    }

    async fn append(&self, record: &CanonicalRecord) -> Result<StoredRecord, StoreError> {
        check_numeric_block(self.numeric_block, record)?;

        let store = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || store.append_blocking(record))
            .await
            .map_err(backend_err)?
    }

    async fn exists(&self, identity: &IdentityTuple) -> Result<bool, StoreError> {
        let store = self.clone();
        let identity = identity.clone();
        tokio::task::spawn_blocking(move || store.exists_blocking(&identity))
            .await
            .map_err(backend_err)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use tempfile::tempdir;

    #[tokio::test]
    async fn append_then_exists_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open("ledger", dir.path().join("records.redb")).unwrap();
        let rec = record("QR-42", "3", "end_of_cut");

        let identity = IdentityTuple::new("QR-42")
            .with_block("3")
            .with_date(rec.date())
            .with_record_type(rec.record_type());
        assert!(!store.exists(&identity).await.unwrap());

        let stored = store.append(&rec).await.unwrap();
        assert_eq!(stored.sequence, 1);
        assert_eq!(stored.store, "ledger");
        assert!(store.exists(&identity).await.unwrap());
        assert!(!store
            .exists(&IdentityTuple::new("QR-43"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn rows_survive_reopen_and_sequence_continues() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.redb");
        {
            let store = RedbStore::open("ledger", &path).unwrap();
            store.append(&record("QR-1", "1", "national")).await.unwrap();
            store.append(&record("QR-2", "2", "end_of_cut")).await.unwrap();
        }

        let store = RedbStore::open("ledger", &path).unwrap();
        let third = store.append(&record("QR-3", "3", "end_of_cut")).await.unwrap();
        assert_eq!(third.sequence, 3);

        let rows = store.rows().unwrap();
        let ids: Vec<_> = rows.iter().map(|row| row.record.id()).collect();
        assert_eq!(ids, ["QR-1", "QR-2", "QR-3"]);
        assert_eq!(rows[0].record.size(), None);
    }

    #[tokio::test]
    async fn concurrent_appends_get_distinct_sequences() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open("ledger", dir.path().join("records.redb")).unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append(&record(&format!("QR-{i}"), "5", "end_of_cut"))
                    .await
                    .unwrap()
                    .sequence
            }));
        }
        let mut sequences = Vec::new();
        for handle in handles {
            sequences.push(handle.await.unwrap());
        }
        sequences.sort_unstable();
        assert_eq!(sequences, (1..=8).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn numeric_schema_rejects_before_writing() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open("table", dir.path().join("records.redb"))
            .unwrap()
            .with_numeric_block(true);
        let err = store
            .append(&record("QR-1", "A3", "end_of_cut"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));
        assert!(store.rows().unwrap().is_empty());
    }
}
