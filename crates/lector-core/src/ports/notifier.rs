//! UI notification port.
//!
//! This module defines the abstraction for pushing application events
//! to whatever surface is listening. Implementations handle transport
//! details (terminal output, GUI bridges, test buffers).

use crate::events::AppEvent;

/// Trait for pushing application events to a UI surface.
///
/// This abstraction keeps event plumbing consistent across domains and
/// prevents channel types from becoming part of the public API surface.
pub trait UiNotifier: Send + Sync {
    /// Push one event to the UI.
    ///
    /// Implementations should buffer or hand off asynchronously; this
    /// method must not block.
    fn notify(&self, event: AppEvent);

    /// Clone this notifier into a boxed trait object.
    ///
    /// This enables cloning of `Arc<dyn UiNotifier>` without requiring
    /// the underlying type to implement Clone.
    fn clone_box(&self) -> Box<dyn UiNotifier>;
}

/// A no-op notifier for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl NoopNotifier {
    /// Create a new no-op notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl UiNotifier for NoopNotifier {
    fn notify(&self, _event: AppEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn UiNotifier> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn noop_notifier_discards_events() {
        let notifier = NoopNotifier::new();
        notifier.notify(AppEvent::ReadingStarted);
    }

    #[test]
    fn noop_notifier_clone_box() {
        let notifier = NoopNotifier::new();
        let _boxed: Box<dyn UiNotifier> = notifier.clone_box();
    }

    #[test]
    fn arc_notifier_is_usable_as_trait_object() {
        let notifier: Arc<dyn UiNotifier> = Arc::new(NoopNotifier::new());
        notifier.notify(AppEvent::SelectionChanged { chars: 0 });
    }
}
