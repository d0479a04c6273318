//! Throttled, best-effort checkpoints of an agent loop.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::id::now_ms;
use crate::storage::{HasId, JsonlStorage, Storage};

const COLLECTION: &str = "checkpoints";

/// Persists loop snapshots by token.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, token: &str, data: &Value) -> Result<()>;
}

/// At most one successful write per cooldown window.
///
/// Requests inside the window are dropped, not queued. Failed writes do not
/// start a new window.
#[derive(Debug, Clone)]
pub struct CheckpointThrottle {
    cooldown: Duration,
    last_write: Option<Instant>,
}

impl CheckpointThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_write: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn should_write(&self, now: Instant) -> bool {
        match self.last_write {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
        }
    }

    pub fn record_write(&mut self, at: Instant) {
        self.last_write = Some(at);
    }
}

/// A stored checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Checkpoint token, `phase:agent`
    pub id: String,
    pub data: Value,
    pub saved_at: u64,
}

impl HasId for Checkpoint {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Checkpoints kept in `checkpoints.jsonl`, latest write per token wins.
pub struct JsonlCheckpointStore {
    storage: JsonlStorage,
}

impl JsonlCheckpointStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            storage: JsonlStorage::new(data_dir)?,
        })
    }

    pub fn load(&self, token: &str) -> Result<Option<Checkpoint>> {
        self.storage.get(COLLECTION, token)
    }
}

#[async_trait]
impl CheckpointStore for JsonlCheckpointStore {
    async fn save(&self, token: &str, data: &Value) -> Result<()> {
        let checkpoint = Checkpoint {
            id: token.to_string(),
            data: data.clone(),
            saved_at: now_ms(),
        };
        self.storage.upsert(COLLECTION, &checkpoint)
    }
}
