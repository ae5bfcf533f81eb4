use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::Collection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Boundary to the hosted document database. Failures are reported to the
/// caller; there is no retry or backoff at this layer.
pub trait DocumentStore {
    fn read(&self, collection: Collection) -> Result<Option<Value>, StoreError>;
    fn write(&mut self, collection: Collection, data: &Value) -> Result<(), StoreError>;
}

// The default log collection is replaced wholesale on write; every other
// collection merges object keys, mirroring keyed appends.
fn merge_write(existing: Option<Value>, collection: Collection, data: &Value) -> Value {
    if collection == Collection::OnshapeLogs {
        return data.clone();
    }
    match (existing, data) {
        (Some(Value::Object(mut current)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                current.insert(k.clone(), v.clone());
            }
            Value::Object(current)
        }
        _ => data.clone(),
    }
}

/// In-memory store for tests and seeding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<&'static str, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(collection: Collection, data: Value) -> Self {
        let mut store = Self::new();
        store.collections.insert(collection.path(), data);
        store
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, collection: Collection) -> Result<Option<Value>, StoreError> {
        Ok(self.collections.get(collection.path()).cloned())
    }

    fn write(&mut self, collection: Collection, data: &Value) -> Result<(), StoreError> {
        let existing = self.collections.get(collection.path()).cloned();
        self.collections
            .insert(collection.path(), merge_write(existing, collection, data));
        Ok(())
    }
}

/// One JSON file per collection under a base directory. Used by the CLI
/// driver in place of the hosted database.
#[derive(Debug)]
pub struct JsonDirStore {
    base: PathBuf,
}

impl JsonDirStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn file_for(&self, collection: Collection) -> PathBuf {
        let name = collection.path().trim_start_matches('/');
        self.base.join(format!("{name}.json"))
    }
}

impl DocumentStore for JsonDirStore {
    fn read(&self, collection: Collection) -> Result<Option<Value>, StoreError> {
        let path = self.file_for(collection);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write(&mut self, collection: Collection, data: &Value) -> Result<(), StoreError> {
        let existing = self.read(collection)?;
        let merged = merge_write(existing, collection, data);
        fs::create_dir_all(&self.base)?;
        fs::write(self.file_for(collection), serde_json::to_string_pretty(&merged)?)?;
        Ok(())
    }
}
