//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired
//! together for the CLI: the file-backed store, the WebSocket
//! transport, the local audio output and the read-aloud controller.
//! Command handlers receive the composed [`CliContext`] and never
//! construct adapters themselves.

use std::env;
use std::sync::Arc;

use anyhow::Result;

use lector_core::ports::KeyValueStore;
use lector_core::settings::Settings;
use lector_speech::{
    AudioOutput, DEFAULT_SPEECH_HOST, LocalAudioOutput, PipelineEvent, ReaderConfig,
    ReaderPipeline, SpeechTransport, WebSocketTransport,
};
use lector_store::{FileStore, StoredSelection};

/// Environment variable overriding the speech service host.
pub const SPEECH_HOST_ENV: &str = "LECTOR_SPEECH_HOST";

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Speech service host.
    pub host: String,
}

impl CliConfig {
    /// Create config from the environment, falling back to defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            host: env::var(SPEECH_HOST_ENV)
                .unwrap_or_else(|_| DEFAULT_SPEECH_HOST.to_string()),
        }
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    store: Arc<dyn KeyValueStore>,
    config: CliConfig,
}

impl CliContext {
    /// Access the shared key-value store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// The configured speech service host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// The stored-selection view over the store.
    #[must_use]
    pub fn selection(&self) -> StoredSelection {
        StoredSelection::new(self.store())
    }

    /// Load the current settings (defaults when none are stored).
    pub async fn settings(&self) -> Result<Settings> {
        Ok(Settings::load_from(self.store.as_ref()).await?)
    }

    /// Build a read-aloud controller against the real transport and
    /// the local audio device.
    ///
    /// Fails when no usable output device exists.
    pub fn reader(
        &self,
        speed: f32,
    ) -> Result<(ReaderPipeline, tokio::sync::mpsc::UnboundedReceiver<PipelineEvent>)> {
        let transport: Arc<dyn SpeechTransport> = Arc::new(WebSocketTransport::new());
        let output: Arc<dyn AudioOutput> = Arc::new(LocalAudioOutput::new()?);
        let config = ReaderConfig {
            host: self.config.host.clone(),
            speed,
        };
        Ok(ReaderPipeline::new(transport, output, config))
    }
}

/// Bootstrap the CLI application.
///
/// Opens the store at its default location under the data directory
/// and composes the context handlers dispatch through.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let store = Arc::new(FileStore::open_default().await?);
    tracing::debug!(host = %config.host, "CLI context composed");
    Ok(CliContext { store, config })
}

/// Compose a context over an existing store (for tests).
#[must_use]
pub fn bootstrap_with(store: Arc<dyn KeyValueStore>, config: CliConfig) -> CliContext {
    CliContext { store, config }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lector_core::SelectionSource;
    use lector_core::ports::keys;

    #[tokio::test]
    async fn bootstrap_opens_a_store_under_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            FileStore::open(dir.path().join("store.json"))
                .await
                .unwrap(),
        );
        let ctx = bootstrap_with(store, CliConfig::with_defaults());

        ctx.store()
            .set(keys::HIGHLIGHTED_TEXT, serde_json::json!("hello"))
            .await
            .unwrap();
        assert_eq!(ctx.selection().current().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn settings_default_when_the_store_is_empty() {
        let store = Arc::new(lector_store::MemoryStore::new());
        let ctx = bootstrap_with(store, CliConfig::with_defaults());

        let settings = ctx.settings().await.unwrap();
        assert_eq!(settings.language, lector_core::settings::DEFAULT_LANGUAGE);
        assert!(settings.api_key.is_empty());
    }
}
