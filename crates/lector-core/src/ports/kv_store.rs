//! Key-value store port with a change feed.
//!
//! This port defines the interface for shared application state.
//! Implementations handle all storage details internally; values travel
//! as `serde_json::Value` so the store does not need to know about
//! domain types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::paths::PathError;

/// Well-known store keys shared across the workspace.
pub mod keys {
    /// The persisted [`Settings`](crate::settings::Settings) object.
    pub const SETTINGS: &str = "settings";

    /// The current text selection, written by the selection command.
    pub const HIGHLIGHTED_TEXT: &str = "highlightedText";

    /// Cached voice catalog, a JSON array of
    /// [`Voice`](crate::voices::Voice) objects.
    pub const CACHED_VOICES: &str = "cachedVoices";
}

/// A single key change, delivered to store subscribers.
///
/// Carries both sides of the change so subscribers can react to what
/// actually happened (e.g. "the API key was cleared") without a second
/// read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyChange {
    /// The key that changed.
    pub key: String,
    /// Value before the change; `None` when the key was absent.
    pub old: Option<Value>,
    /// Value after the change; `None` when the key was removed.
    pub new: Option<Value>,
}

impl KeyChange {
    /// `true` when this change removed the key.
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        self.new.is_none()
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Failed to read the backing file.
    #[error("failed to read store file {path}: {reason}")]
    Read { path: String, reason: String },

    /// Failed to write the backing file.
    #[error("failed to write store file {path}: {reason}")]
    Write { path: String, reason: String },

    /// A stored value does not deserialize into the expected shape.
    #[error("store value under '{key}' is invalid: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Could not resolve the store location.
    #[error("failed to resolve store path: {0}")]
    Path(String),
}

impl From<PathError> for StoreError {
    fn from(e: PathError) -> Self {
        Self::Path(e.to_string())
    }
}

/// Persistent key-value storage with subscribe-on-change.
///
/// The hosting application owns one store and injects it everywhere;
/// domain code never touches globals. A write that leaves a value
/// unchanged must not notify subscribers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write `value` under `key`, notifying subscribers when it
    /// changed.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Remove `key`, notifying subscribers when it existed.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Subscribe to the change feed.
    ///
    /// Slow subscribers may miss changes (broadcast semantics); the
    /// store never blocks on them.
    fn subscribe(&self) -> broadcast::Receiver<KeyChange>;
}
