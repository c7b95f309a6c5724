//! In-memory key-value store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, broadcast};

use lector_core::ports::{KeyChange, KeyValueStore, StoreError};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A [`KeyValueStore`] that keeps everything in memory.
///
/// Same contract as [`FileStore`](crate::FileStore) minus the disk:
/// used by tests and by ephemeral runs that should leave no state
/// behind.
pub struct MemoryStore {
    entries: Mutex<Map<String, Value>>,
    changes: broadcast::Sender<KeyChange>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(Map::new()),
            changes,
        }
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

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.get(key) == Some(&value) {
            return Ok(());
        }
        let old = entries.insert(key.to_string(), value.clone());
        drop(entries);
        self.notify(key, old, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let Some(old) = entries.remove(key) else {
            return Ok(());
        };
        drop(entries);
        self.notify(key, Some(old), None);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<KeyChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lector_core::ports::keys;
    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store.set(keys::SETTINGS, json!({"language": "en"})).await.unwrap();
        let value = store.get(keys::SETTINGS).await.unwrap();
        assert_eq!(value, Some(json!({"language": "en"})));
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unchanged_write_does_not_notify() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();

        store.set("k", json!("v")).await.unwrap();
        store.set("k", json!("v")).await.unwrap();

        let first = changes.try_recv().unwrap();
        assert_eq!(first.new, Some(json!("v")));
        assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn remove_of_absent_key_is_silent() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe();
        store.remove("absent").await.unwrap();
        assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));
    }
}
