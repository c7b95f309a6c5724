//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the core domain expects from
//! infrastructure. They contain no implementation details and use only
//! domain types plus `serde_json::Value`.
//!
//! # Design Rules
//!
//! - No filesystem or network types in any signature
//! - Stored values travel as JSON so adapters stay interchangeable
//! - Notification must never block domain code

pub mod kv_store;
pub mod notifier;
pub mod selection;

pub use kv_store::{KeyChange, KeyValueStore, StoreError, keys};
pub use notifier::{NoopNotifier, UiNotifier};
pub use selection::SelectionSource;
