//! Terminal implementation of the UI notification port.

use lector_core::events::{AlertSeverity, AppEvent};
use lector_core::ports::UiNotifier;

/// [`UiNotifier`] that renders events on stdout/stderr.
///
/// Alerts always print; state chatter (progress ticks, state changes)
/// only prints in verbose mode and otherwise goes to the debug log.
#[derive(Debug, Clone)]
pub struct ConsoleNotifier {
    verbose: bool,
}

impl ConsoleNotifier {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl UiNotifier for ConsoleNotifier {
    fn notify(&self, event: AppEvent) {
        match event {
            AppEvent::Alert { severity, message } => match severity {
                AlertSeverity::Error => eprintln!("error: {message}"),
                AlertSeverity::Info => println!("{message}"),
            },
            AppEvent::ReadingStarted => println!("Reading..."),
            AppEvent::ReadingStateChanged { state, .. } => {
                if self.verbose {
                    println!("[{state}]");
                } else {
                    tracing::debug!(state, "reader state");
                }
            }
            AppEvent::ReadingProgress { cursor_seconds } => {
                if self.verbose {
                    println!("  {cursor_seconds:.2}s scheduled");
                }
            }
            AppEvent::SelectionChanged { chars } => {
                if self.verbose {
                    println!("selection: {chars} chars");
                }
            }
            AppEvent::VoicesRefreshed { count } => {
                if self.verbose {
                    println!("voices: {count} fetched");
                }
            }
        }
    }

    fn clone_box(&self) -> Box<dyn UiNotifier> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_is_cloneable_as_a_trait_object() {
        let notifier = ConsoleNotifier::new(false);
        let boxed: Box<dyn UiNotifier> = notifier.clone_box();
        boxed.notify(AppEvent::ReadingStarted);
    }
}
