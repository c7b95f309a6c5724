//! Current-selection port.

use async_trait::async_trait;

use super::kv_store::StoreError;

/// Read access to the user's current text selection.
///
/// The read-aloud controller consults this once per session start when
/// no explicit text was given. Live updates travel through the store's
/// change feed, not through this trait.
#[async_trait]
pub trait SelectionSource: Send + Sync {
    /// The currently selected text, empty when nothing is selected.
    ///
    /// Implementations return the text already trimmed; callers treat
    /// an empty string as "no selection".
    async fn current(&self) -> Result<String, StoreError>;
}
