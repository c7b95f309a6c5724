//! Voice catalog client with store-backed caching.
//!
//! The catalog is fetched from the service's `/voices` endpoint and
//! mirrored under the `cachedVoices` store key, so the list keeps
//! working offline or while the API key is missing - the same
//! read-through behavior the settings surface has always had. A fetch
//! failure falls back to stale cache; only "no key, no cache, fetch
//! failed" surfaces an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use lector_core::ports::{KeyValueStore, keys};
use lector_core::voices::Voice;

use crate::error::SpeechError;

/// Alert shown when the catalog cannot be fetched and no cache exists.
pub const INVALID_KEY_MESSAGE: &str = "please enter a valid API key";

/// The voices endpoint seam.
///
/// Object-safe so the caching policy can be tested against canned
/// responses.
#[async_trait]
pub trait VoicesApi: Send + Sync {
    /// Fetch the full voice catalog.
    async fn fetch_voices(&self, api_key: &str) -> Result<Vec<Voice>, SpeechError>;
}

// ── Wire envelope ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VoicesEnvelope {
    data: VoicesData,
}

#[derive(Debug, Deserialize)]
struct VoicesData {
    voices: Vec<Voice>,
}

// ── Production client ──────────────────────────────────────────────

/// Production [`VoicesApi`] over HTTPS.
pub struct VoicesClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl VoicesClient {
    /// Create a client against `host`'s `/voices` endpoint.
    pub fn new(host: &str) -> Result<Self, SpeechError> {
        let endpoint = Url::parse(&format!("https://{host}/voices"))
            .map_err(|e| SpeechError::VoicesFetch(format!("invalid voices URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SpeechError::VoicesFetch(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl VoicesApi for VoicesClient {
    async fn fetch_voices(&self, api_key: &str) -> Result<Vec<Voice>, SpeechError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header("X-API-Key", api_key)
            .send()
            .await
            .map_err(|e| SpeechError::VoicesFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::VoicesFetch(format!(
                "voices request failed with status {status}"
            )));
        }

        let envelope: VoicesEnvelope = response
            .json()
            .await
            .map_err(|e| SpeechError::VoicesFetch(format!("invalid voices payload: {e}")))?;
        debug!(count = envelope.data.voices.len(), "voice catalog fetched");
        Ok(envelope.data.voices)
    }
}

// ── Cache-aware listing ────────────────────────────────────────────

/// A voice catalog plus where it came from.
#[derive(Debug)]
pub struct VoiceListing {
    /// The catalog entries.
    pub voices: Vec<Voice>,
    /// `true` when served from the store cache instead of the service.
    pub from_cache: bool,
}

/// List voices, refreshing the store cache when possible.
///
/// - Empty API key: serve the cache only (possibly empty), no request.
/// - Fetch succeeds: refresh the cache and serve the fresh catalog.
/// - Fetch fails: fall back to a non-empty stale cache, otherwise
///   surface [`SpeechError::VoicesFetch`].
pub async fn list_voices(
    api: &dyn VoicesApi,
    store: &dyn KeyValueStore,
    api_key: &str,
) -> Result<VoiceListing, SpeechError> {
    if api_key.trim().is_empty() {
        return Ok(VoiceListing {
            voices: cached_voices(store).await,
            from_cache: true,
        });
    }

    match api.fetch_voices(api_key).await {
        Ok(voices) => {
            match serde_json::to_value(&voices) {
                Ok(value) => {
                    if let Err(e) = store.set(keys::CACHED_VOICES, value).await {
                        warn!(error = %e, "failed to cache voice catalog");
                    }
                }
                Err(e) => warn!(error = %e, "voice catalog is not serializable"),
            }
            Ok(VoiceListing {
                voices,
                from_cache: false,
            })
        }
        Err(e) => {
            warn!(error = %e, "voices fetch failed, falling back to cache");
            let cached = cached_voices(store).await;
            if cached.is_empty() {
                Err(SpeechError::VoicesFetch(INVALID_KEY_MESSAGE.to_string()))
            } else {
                Ok(VoiceListing {
                    voices: cached,
                    from_cache: true,
                })
            }
        }
    }
}

async fn cached_voices(store: &dyn KeyValueStore) -> Vec<Voice> {
    match store.get(keys::CACHED_VOICES).await {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "failed to read cached voices");
            Vec::new()
        }
    }
}
