//! Canonical event union pushed to UI adapters.
//!
//! Events are produced by domain code and forwarded through a
//! [`UiNotifier`](crate::ports::UiNotifier). The JSON shape is part of
//! the contract with embedding UIs: `type` carries the snake_case
//! variant name and payload fields use camelCase, so renaming a variant
//! or field is a breaking change. `event_name` values are what log
//! lines and wire protocols key on.

use serde::{Deserialize, Serialize};

/// How an alert should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational, e.g. "nothing selected".
    Info,
    /// Something failed and the user should act.
    Error,
}

/// Canonical event types pushed to UI adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// The read-aloud controller changed state.
    ReadingStateChanged {
        /// `true` while a session is connecting or audible.
        #[serde(rename = "isReading")]
        is_reading: bool,
        /// Controller state label, e.g. `"reading"` or `"idle"`.
        state: String,
    },

    /// The first audio frame of a session started playing.
    ReadingStarted,

    /// An audio frame was scheduled; progress tick for indicators.
    ReadingProgress {
        /// Timeline position after the frame, in seconds from session
        /// start.
        #[serde(rename = "cursorSeconds")]
        cursor_seconds: f64,
    },

    /// A user-facing alert.
    Alert {
        severity: AlertSeverity,
        message: String,
    },

    /// The stored text selection changed.
    SelectionChanged {
        /// Length of the new selection, zero when cleared.
        chars: usize,
    },

    /// The voice catalog was refreshed from the service.
    VoicesRefreshed { count: usize },
}

impl AppEvent {
    /// Stable event name used in log lines and wire protocols.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ReadingStateChanged { .. } => "reader:state_changed",
            Self::ReadingStarted => "reader:started",
            Self::ReadingProgress { .. } => "reader:progress",
            Self::Alert { .. } => "reader:alert",
            Self::SelectionChanged { .. } => "selection:changed",
            Self::VoicesRefreshed { .. } => "voices:refreshed",
        }
    }

    /// Convenience constructor for informational alerts.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::Alert {
            severity: AlertSeverity::Info,
            message: message.into(),
        }
    }

    /// Convenience constructor for error alerts.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Alert {
            severity: AlertSeverity::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_stable() {
        let cases = [
            (
                AppEvent::ReadingStateChanged {
                    is_reading: true,
                    state: "reading".to_string(),
                },
                "reader:state_changed",
            ),
            (AppEvent::ReadingStarted, "reader:started"),
            (
                AppEvent::ReadingProgress {
                    cursor_seconds: 1.25,
                },
                "reader:progress",
            ),
            (AppEvent::error("boom"), "reader:alert"),
            (AppEvent::SelectionChanged { chars: 12 }, "selection:changed"),
            (AppEvent::VoicesRefreshed { count: 3 }, "voices:refreshed"),
        ];
        for (event, name) in cases {
            assert_eq!(event.event_name(), name);
        }
    }

    #[test]
    fn state_change_serializes_with_camel_case_fields() {
        let event = AppEvent::ReadingStateChanged {
            is_reading: true,
            state: "connecting".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "reading_state_changed");
        assert_eq!(value["isReading"], true);
        assert_eq!(value["state"], "connecting");
    }

    #[test]
    fn alert_severity_serializes_lowercase() {
        let value = serde_json::to_value(AppEvent::info("pick a voice")).unwrap();
        assert_eq!(value["severity"], "info");
        assert_eq!(value["message"], "pick a voice");
    }

    #[test]
    fn unit_variants_serialize_as_bare_type() {
        let value = serde_json::to_value(AppEvent::ReadingStarted).unwrap();
        assert_eq!(value, serde_json::json!({ "type": "reading_started" }));
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = AppEvent::VoicesRefreshed { count: 7 };
        let json = serde_json::to_string(&event).unwrap();
        let back: AppEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, AppEvent::VoicesRefreshed { count: 7 }));
    }
}
