//! Store-backed implementation of the selection port.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use lector_core::ports::{KeyValueStore, SelectionSource, StoreError, keys};

/// [`SelectionSource`] reading the shared `highlightedText` key.
///
/// The selection command writes the key; the read-aloud controller
/// reads it here at session start. Writers are expected to store
/// trimmed text, but [`current`](SelectionSource::current) trims again
/// so a hand-edited store file behaves the same.
pub struct StoredSelection {
    store: Arc<dyn KeyValueStore>,
}

impl StoredSelection {
    /// Wrap `store` as a selection source.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store `text` (trimmed) as the current selection.
    ///
    /// An empty or whitespace-only `text` clears the selection instead
    /// of storing an empty string.
    pub async fn update(&self, text: &str) -> Result<(), StoreError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("clearing selection");
            self.store.remove(keys::HIGHLIGHTED_TEXT).await
        } else {
            debug!(chars = trimmed.len(), "selection updated");
            self.store
                .set(keys::HIGHLIGHTED_TEXT, trimmed.into())
                .await
        }
    }
}

#[async_trait]
impl SelectionSource for StoredSelection {
    async fn current(&self) -> Result<String, StoreError> {
        let value = self.store.get(keys::HIGHLIGHTED_TEXT).await?;
        Ok(value
            .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn selection() -> StoredSelection {
        StoredSelection::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn current_is_empty_when_nothing_selected() {
        let selection = selection();
        assert_eq!(selection.current().await.unwrap(), "");
    }

    #[tokio::test]
    async fn update_stores_trimmed_text() {
        let selection = selection();
        selection.update("  hello world \n").await.unwrap();
        assert_eq!(selection.current().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn whitespace_update_clears_the_selection() {
        let selection = selection();
        selection.update("hello").await.unwrap();
        selection.update("   ").await.unwrap();
        assert_eq!(selection.current().await.unwrap(), "");
    }

    #[tokio::test]
    async fn non_string_value_reads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(keys::HIGHLIGHTED_TEXT, serde_json::json!(42))
            .await
            .unwrap();
        let selection = StoredSelection::new(store);
        assert_eq!(selection.current().await.unwrap(), "");
    }
}
