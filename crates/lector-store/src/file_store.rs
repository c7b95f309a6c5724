//! JSON-file-backed key-value store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use lector_core::paths::data_root;
use lector_core::ports::{KeyChange, KeyValueStore, StoreError};

/// File name of the store inside the data directory.
pub const STORE_FILE_NAME: &str = "store.json";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A key-value store persisted as one pretty-printed JSON object.
///
/// The whole object is held in memory and rewritten on every change.
/// The store holds a handful of small keys (settings, the current
/// selection, a cached voice catalog), not bulk data, so a single file
/// beats a database here.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
    changes: broadcast::Sender<KeyChange>,
}

impl FileStore {
    /// Open the store at `path`, loading existing contents.
    ///
    /// A missing file is an empty store; the file is created on first
    /// write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) => parse_snapshot(&path, &text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };
        debug!(path = %path.display(), keys = entries.len(), "opened store");
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            changes,
        })
    }

    /// Open the store at its default location inside the data
    /// directory.
    pub async fn open_default() -> Result<Self, StoreError> {
        let path = data_root()?.join(STORE_FILE_NAME);
        Self::open(path).await
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let write_err = |reason: String| StoreError::Write {
            path: self.path.display().to_string(),
            reason,
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(entries.clone()))
            .map_err(|e| write_err(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| write_err(e.to_string()))
    }

    fn notify(&self, key: &str, old: Option<Value>, new: Option<Value>) {
        let change = KeyChange {
            key: key.to_string(),
            old,
            new,
        };
        // Nobody listening is fine.
        let _ = self.changes.send(change);
    }
}

fn parse_snapshot(path: &Path, text: &str) -> Result<Map<String, Value>, StoreError> {
    let value: Value = serde_json::from_str(text).map_err(|e| StoreError::Read {
        path: path.display().to_string(),
        reason: format!("invalid JSON: {e}"),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Read {
            path: path.display().to_string(),
            reason: "top-level value is not an object".to_string(),
        }),
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.get(key) == Some(&value) {
            return Ok(());
        }
        let old = entries.insert(key.to_string(), value.clone());
        self.persist(&entries).await?;
        drop(entries);
        debug!(key, "store key updated");
        self.notify(key, old, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let Some(old) = entries.remove(key) else {
            return Ok(());
        };
        self.persist(&entries).await?;
        drop(entries);
        debug!(key, "store key removed");
        self.notify(key, Some(old), None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<KeyChange> {
        self.changes.subscribe()
    }
}
