//! JSONL-based storage implementation with in-memory caching.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Serialize, de::DeserializeOwned};

use super::traits::{Filter, HasId, Storage};
use crate::error::{PhasegateError, Result};

/// JSONL-based storage with in-memory caching.
///
/// One file per collection. Creates append; updates rewrite the file.
pub struct JsonlStorage {
    base_path: PathBuf,
    cache: RwLock<HashMap<String, Vec<serde_json::Value>>>,
}

impl std::fmt::Debug for JsonlStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlStorage")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

fn lock_err<E: std::fmt::Display>(e: E) -> PhasegateError {
    PhasegateError::Storage(e.to_string())
}

fn not_loaded(collection: &str) -> PhasegateError {
    PhasegateError::Storage(format!("Collection not loaded: {}", collection))
}

impl JsonlStorage {
    /// Create a new JsonlStorage at the given path.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", collection))
    }

    /// Load a collection into cache if not already loaded.
    fn ensure_loaded(&self, collection: &str) -> Result<()> {
        {
            let cache = self.cache.read().map_err(lock_err)?;
            if cache.contains_key(collection) {
                return Ok(());
            }
        }

        let mut cache = self.cache.write().map_err(lock_err)?;
        if cache.contains_key(collection) {
            return Ok(());
        }

        let path = self.collection_path(collection);
        let mut records = Vec::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    records.push(serde_json::from_str(&line)?);
                }
            }
        }

        cache.insert(collection.to_string(), records);
        Ok(())
    }

    fn append_to_file(&self, collection: &str, record: &serde_json::Value) -> Result<()> {
        let path = self.collection_path(collection);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        file.sync_data()?;
        Ok(())
    }

    /// Rewrite the collection file from cache via a temp file and rename.
    fn rewrite_file(&self, collection: &str) -> Result<()> {
        let cache = self.cache.read().map_err(lock_err)?;
        let records = cache.get(collection).ok_or_else(|| not_loaded(collection))?;

        let path = self.collection_path(collection);
        let tmp_path = path.with_extension("jsonl.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            for record in records {
                writeln!(file, "{}", serde_json::to_string(record)?)?;
            }
            file.sync_data()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl Storage for JsonlStorage {
    fn create<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, record: &T) -> Result<()> {
        self.ensure_loaded(collection)?;

        let value = serde_json::to_value(record)?;

        // File first, it is the source of truth
        self.append_to_file(collection, &value)?;

        let mut cache = self.cache.write().map_err(lock_err)?;
        cache
            .get_mut(collection)
            .ok_or_else(|| not_loaded(collection))?
            .push(value);

        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        self.ensure_loaded(collection)?;

        let cache = self.cache.read().map_err(lock_err)?;
        let records = cache.get(collection).ok_or_else(|| not_loaded(collection))?;

        records
            .iter()
            .find(|r| r.get("id").and_then(|v| v.as_str()) == Some(id))
            .map(|r| serde_json::from_value(r.clone()).map_err(PhasegateError::from))
            .transpose()
    }

    fn update<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, id: &str, record: &T) -> Result<()> {
        self.ensure_loaded(collection)?;

        let value = serde_json::to_value(record)?;

        {
            let mut cache = self.cache.write().map_err(lock_err)?;
            let records = cache.get_mut(collection).ok_or_else(|| not_loaded(collection))?;

            let slot = records
                .iter_mut()
                .find(|r| r.get("id").and_then(|v| v.as_str()) == Some(id))
                .ok_or_else(|| PhasegateError::NotFound(id.to_string()))?;
            *slot = value;
        }

        self.rewrite_file(collection)
    }

    fn query<T: DeserializeOwned>(&self, collection: &str, filters: &[Filter]) -> Result<Vec<T>> {
        self.ensure_loaded(collection)?;

        let cache = self.cache.read().map_err(lock_err)?;
        let records = cache.get(collection).ok_or_else(|| not_loaded(collection))?;

        let mut results = Vec::new();
        for record in records {
            if filters.iter().all(|f| f.matches(record)) {
                results.push(serde_json::from_value(record.clone())?);
            }
        }

        Ok(results)
    }
}
