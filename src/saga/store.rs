//! Durable saga records.

use std::path::Path;
use std::sync::Mutex;

use super::types::{SagaRecord, SagaStatus};
use crate::error::{PhasegateError, Result};
use crate::storage::{Filter, JsonlStorage, Storage};

const COLLECTION: &str = "sagas";

/// Persists saga snapshots; the latest save for an id wins.
pub trait SagaStore: Send + Sync {
    fn save(&self, record: &SagaRecord) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<SagaRecord>>;

    /// All sagas, optionally only those in one status, in creation order.
    fn list(&self, status: Option<SagaStatus>) -> Result<Vec<SagaRecord>>;
}

/// Sagas kept in `sagas.jsonl` under the data directory.
pub struct JsonlSagaStore {
    storage: JsonlStorage,
}

impl JsonlSagaStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            storage: JsonlStorage::new(data_dir)?,
        })
    }
}

impl SagaStore for JsonlSagaStore {
    fn save(&self, record: &SagaRecord) -> Result<()> {
        self.storage.upsert(COLLECTION, record)
    }

    fn get(&self, id: &str) -> Result<Option<SagaRecord>> {
        self.storage.get(COLLECTION, id)
    }

    fn list(&self, status: Option<SagaStatus>) -> Result<Vec<SagaRecord>> {
        match status {
            Some(status) => self.storage.query(COLLECTION, &[Filter::eq("status", status)]),
            None => self.storage.list(COLLECTION),
        }
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySagaStore {
    records: Mutex<Vec<SagaRecord>>,
    /// Every save, in order, for inspecting transitions
    history: Mutex<Vec<SagaRecord>>,
}

fn lock_err<E: std::fmt::Display>(e: E) -> PhasegateError {
    PhasegateError::Storage(e.to_string())
}

impl MemorySagaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<SagaRecord> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl SagaStore for MemorySagaStore {
    fn save(&self, record: &SagaRecord) -> Result<()> {
        let mut records = self.records.lock().map_err(lock_err)?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.history.lock().map_err(lock_err)?.push(record.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<SagaRecord>> {
        let records = self.records.lock().map_err(lock_err)?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    fn list(&self, status: Option<SagaStatus>) -> Result<Vec<SagaRecord>> {
        let records = self.records.lock().map_err(lock_err)?;
        Ok(records
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect())
    }
}
