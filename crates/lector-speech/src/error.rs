//! Speech pipeline error types.

use lector_core::events::AlertSeverity;
use lector_core::settings::SettingsError;

/// Errors that can occur in the read-aloud pipeline.
///
/// Decode errors are contained per chunk and never abort a session;
/// every other variant ends the session and returns the controller to
/// idle. Nothing here is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// Settings are incomplete - no session was started.
    #[error("cannot start reading: {0}")]
    Configuration(#[from] SettingsError),

    /// There is no text to read.
    #[error("nothing to read - select some text first")]
    NoInput,

    /// A single audio chunk could not be decoded.
    #[error("failed to decode audio chunk: {0}")]
    Decode(String),

    /// The speech service connection failed.
    #[error("speech service connection failed: {0}")]
    Transport(String),

    /// The audio output device could not be used.
    #[error("failed to open audio output: {0}")]
    Output(String),

    /// The voice catalog could not be fetched.
    #[error("failed to fetch voices: {0}")]
    VoicesFetch(String),

    /// The session was cancelled by the user. Normal teardown, not a
    /// failure.
    #[error("reading cancelled")]
    Cancelled,
}

impl SpeechError {
    /// How this error should be presented to the user.
    ///
    /// "Nothing selected" is information, not a failure.
    #[must_use]
    pub const fn severity(&self) -> AlertSeverity {
        match self {
            Self::NoInput => AlertSeverity::Info,
            _ => AlertSeverity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_is_informational() {
        assert_eq!(SpeechError::NoInput.severity(), AlertSeverity::Info);
    }

    #[test]
    fn transport_failure_is_an_error() {
        let error = SpeechError::Transport("connection refused".to_string());
        assert_eq!(error.severity(), AlertSeverity::Error);
    }

    #[test]
    fn configuration_errors_carry_the_settings_message() {
        let error = SpeechError::from(SettingsError::MissingApiKey);
        assert!(error.to_string().contains("no API key configured"));
    }
}
