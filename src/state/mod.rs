//! Per-node static data that survives between trigger activations.
//!
//! The workflow host owns this storage; the trigger only reads and writes it
//! through [`StaticDataStore`]. [`NodeStaticData`] keeps the values in memory
//! and, when given a path, mirrors every change to a JSON file.

mod types;

pub use types::*;

use anyhow::Result as AnyResult;
use cloudconvert_common::{Error, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key-value storage scoped to a single node.
pub trait StaticDataStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory static data with optional JSON file persistence.
#[derive(Debug, Default)]
pub struct NodeStaticData {
    values: RwLock<Map<String, Value>>,
    persistence_path: Option<PathBuf>,
}

impl NodeStaticData {
    /// Memory-only storage.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Storage mirrored to `path`; existing contents are loaded.
    pub fn persistent(path: PathBuf) -> Self {
        let data = Self {
            values: RwLock::new(Map::new()),
            persistence_path: Some(path),
        };

        if let Some(ref path) = data.persistence_path {
            if let Err(e) = data.load_from_file(path) {
                tracing::warn!("Failed to load persisted node data: {}", e);
            }
        }

        data
    }

    /// Copy of all stored values.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values.read().clone()
    }

    fn persist(&self) -> Result<()> {
        if let Some(ref path) = self.persistence_path {
            self.save_to_file(path)
                .map_err(|e| Error::storage(format!("{}: {}", path.display(), e)))?;
        }
        Ok(())
    }

    fn save_to_file(&self, path: &Path) -> AnyResult<()> {
        let json = serde_json::to_string_pretty(&*self.values.read())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    fn load_from_file(&self, path: &Path) -> AnyResult<()> {
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)?;
        let values: Map<String, Value> = serde_json::from_str(&content)?;
        *self.values.write() = values;
        Ok(())
    }
}

impl StaticDataStore for NodeStaticData {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        self.persist()
    }

    fn remove(&self, key: &str) -> Result<()> {
        let removed = self.values.write().remove(key).is_some();
        if removed {
            self.persist()?;
        }
        Ok(())
    }
}
