//! Stream receiver - the WebSocket session with the speech service.
//!
//! One transport session per read-aloud invocation:
//! `Closed → Connecting → Open → Closed` (or `→ Error → Closed`).
//! Session parameters (voice, language, speed, credential) travel only
//! as handshake metadata in the URL query - the service was built for
//! browser WebSockets, which cannot set headers - and the payload body
//! carries nothing but the text to synthesize followed by the
//! [`STOP_COMMAND`] sentinel.
//!
//! Inbound traffic is a sequence of JSON envelopes. Messages without a
//! usable audio field (heartbeats, control traffic) are ignored
//! silently; they are not errors.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use url::Url;

use crate::decode::{AudioChunk, DEFAULT_SAMPLING_RATE_HZ};
use crate::error::SpeechError;

/// Default speech service host.
pub const DEFAULT_SPEECH_HOST: &str = "eu-west-1.api.neuphonic.com";

/// Sentinel sent after the text so the service knows no more input
/// follows.
pub const STOP_COMMAND: &str = "<STOP>";

/// Connection-establishment metadata for one session.
#[derive(Debug, Clone)]
pub struct StreamParams {
    /// Service host, e.g. `eu-west-1.api.neuphonic.com`.
    pub host: String,
    /// Language code the synthesis endpoint is addressed with.
    pub language: String,
    /// Voice to synthesize with.
    pub voice_id: String,
    /// Playback speed multiplier.
    pub speed: f32,
    /// API key credential.
    pub api_key: String,
}

impl StreamParams {
    /// The `wss://` handshake URL carrying all session parameters.
    pub fn speak_url(&self) -> Result<Url, SpeechError> {
        let mut url = Url::parse(&format!("wss://{}/speak/{}", self.host, self.language))
            .map_err(|e| SpeechError::Transport(format!("invalid speak URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("voice_id", &self.voice_id)
            .append_pair("speed", &self.speed.to_string())
            .append_pair("api_key", &self.api_key);
        Ok(url)
    }
}

/// Events emitted by a transport session, in order.
#[derive(Debug)]
pub enum StreamEvent {
    /// The transport is ready; the text payload may be sent.
    Opened,

    /// An audio chunk arrived.
    Chunk(AudioChunk),

    /// The transport closed normally - end of stream. Scheduled audio
    /// may still be playing.
    Closed,

    /// The transport failed. Terminal; no `Closed` follows.
    Failed(String),
}

/// Commands a session handle can send to its transport task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamCommand {
    /// Send a text payload over the transport.
    Send(String),
    /// Close the transport.
    Close,
}

/// Handle for driving an open transport session.
///
/// Both operations are fire-and-forget: once the transport task has
/// ended, commands fall on a closed channel and are dropped, which
/// makes [`close`](Self::close) idempotent and safe from any state.
#[derive(Debug, Clone)]
pub struct StreamControl {
    cmd_tx: mpsc::UnboundedSender<StreamCommand>,
}

impl StreamControl {
    /// Create a control handle and the receiving end of its command
    /// channel. Transport implementations (and test fakes) consume the
    /// receiver.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        (Self { cmd_tx }, cmd_rx)
    }

    /// Send a text payload over the transport.
    pub fn send(&self, payload: impl Into<String>) {
        let _ = self.cmd_tx.send(StreamCommand::Send(payload.into()));
    }

    /// Close the transport. Idempotent; always releases the transport
    /// task.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(StreamCommand::Close);
    }
}

/// The transport seam the controller speaks through.
///
/// Object-safe so tests can substitute scripted fakes for the network.
#[async_trait]
pub trait SpeechTransport: Send + Sync {
    /// Open a session. Events arrive on the returned receiver in
    /// order; the [`StreamControl`] drives the session.
    async fn open(
        &self,
        params: &StreamParams,
    ) -> Result<(StreamControl, mpsc::UnboundedReceiver<StreamEvent>), SpeechError>;
}

// ── Wire envelope ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<EnvelopeData>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    audio: Option<String>,
    sampling_rate: Option<u32>,
}

/// Parse a text frame into an audio chunk, if it carries one.
fn parse_audio_message(text: &str) -> Option<AudioChunk> {
    let envelope: Envelope = serde_json::from_str(text).ok()?;
    let data = envelope.data?;
    let audio = data.audio?;
    Some(AudioChunk {
        audio,
        sampling_rate: data.sampling_rate.unwrap_or(DEFAULT_SAMPLING_RATE_HZ),
    })
}

// ── Production transport ───────────────────────────────────────────

/// Internal transport state, tracked for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Connecting,
    Open,
    Closed,
}

fn transition(state: &mut StreamState, next: StreamState) {
    tracing::debug!(from = ?*state, to = ?next, "stream state");
    *state = next;
}

/// Production [`SpeechTransport`] over `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Create the production transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SpeechTransport for WebSocketTransport {
    async fn open(
        &self,
        params: &StreamParams,
    ) -> Result<(StreamControl, mpsc::UnboundedReceiver<StreamEvent>), SpeechError> {
        let url = params.speak_url()?;
        let (control, cmd_rx) = StreamControl::channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_session(url, cmd_rx, event_tx));

        Ok((control, event_rx))
    }
}

/// The transport task: connect, then pump frames and commands until
/// either side closes.
async fn run_session(
    url: Url,
    mut cmd_rx: mpsc::UnboundedReceiver<StreamCommand>,
    event_tx: mpsc::UnboundedSender<StreamEvent>,
) {
    let mut state = StreamState::Connecting;
    tracing::debug!(host = %url.host_str().unwrap_or_default(), "connecting to speech service");

    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "speech service connection failed");
            let _ = event_tx.send(StreamEvent::Failed(e.to_string()));
            return;
        }
    };

    transition(&mut state, StreamState::Open);
    if event_tx.send(StreamEvent::Opened).is_err() {
        return;
    }

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match parse_audio_message(&text) {
                            Some(chunk) => {
                                if event_tx.send(StreamEvent::Chunk(chunk)).is_err() {
                                    break;
                                }
                            }
                            // Heartbeat or control message - not an error.
                            None => tracing::trace!("ignoring non-audio message"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        transition(&mut state, StreamState::Closed);
                        let _ = event_tx.send(StreamEvent::Closed);
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong and binary frames carry no audio here.
                    }
                    Some(Err(e)) => {
                        transition(&mut state, StreamState::Closed);
                        tracing::warn!(error = %e, "speech stream failed");
                        let _ = event_tx.send(StreamEvent::Failed(e.to_string()));
                        break;
                    }
                }
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(StreamCommand::Send(payload)) => {
                        if let Err(e) = write.send(Message::Text(payload.into())).await {
                            transition(&mut state, StreamState::Closed);
                            tracing::warn!(error = %e, "failed to send payload");
                            let _ = event_tx.send(StreamEvent::Failed(e.to_string()));
                            break;
                        }
                    }
                    // Close requested, or every control handle dropped.
                    Some(StreamCommand::Close) | None => {
                        transition(&mut state, StreamState::Closed);
                        let _ = write.send(Message::Close(None)).await;
                        let _ = event_tx.send(StreamEvent::Closed);
                        break;
                    }
                }
            }
        }
    }

    if state != StreamState::Closed {
        // Event receiver dropped mid-stream; the socket drops with us.
        transition(&mut state, StreamState::Closed);
    }
    tracing::debug!("speech stream task ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StreamParams {
        StreamParams {
            host: DEFAULT_SPEECH_HOST.to_string(),
            language: "en".to_string(),
            voice_id: "fc854436-2dac-4d21-aa69-ae17b54e98eb".to_string(),
            speed: 1.0,
            api_key: "nk-test".to_string(),
        }
    }

    #[test]
    fn speak_url_carries_session_parameters_in_the_query() {
        let url = params().speak_url().unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.host_str(), Some(DEFAULT_SPEECH_HOST));
        assert_eq!(url.path(), "/speak/en");

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(query.contains(&(
            "voice_id".to_string(),
            "fc854436-2dac-4d21-aa69-ae17b54e98eb".to_string()
        )));
        assert!(query.contains(&("speed".to_string(), "1".to_string())));
        assert!(query.contains(&("api_key".to_string(), "nk-test".to_string())));
    }

    #[test]
    fn audio_envelope_parses_into_a_chunk() {
        let chunk =
            parse_audio_message(r#"{"data":{"audio":"AQA=","sampling_rate":44100}}"#).unwrap();
        assert_eq!(chunk.audio, "AQA=");
        assert_eq!(chunk.sampling_rate, 44_100);
    }

    #[test]
    fn missing_sampling_rate_defaults() {
        let chunk = parse_audio_message(r#"{"data":{"audio":"AQA="}}"#).unwrap();
        assert_eq!(chunk.sampling_rate, DEFAULT_SAMPLING_RATE_HZ);
    }

    #[test]
    fn non_audio_messages_are_ignored() {
        assert!(parse_audio_message(r#"{"status":"ok"}"#).is_none());
        assert!(parse_audio_message(r#"{"data":{"heartbeat":true}}"#).is_none());
        assert!(parse_audio_message("not json").is_none());
    }

    #[test]
    fn control_commands_reach_the_receiver() {
        let (control, mut cmd_rx) = StreamControl::channel();
        control.send("hello");
        control.send(STOP_COMMAND);
        control.close();

        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(StreamCommand::Send(text)) if text == "hello"
        ));
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(StreamCommand::Send(text)) if text == STOP_COMMAND
        ));
        assert!(matches!(cmd_rx.try_recv(), Ok(StreamCommand::Close)));
    }

    #[test]
    fn close_after_task_end_is_a_silent_noop() {
        let (control, cmd_rx) = StreamControl::channel();
        drop(cmd_rx);
        control.close();
        control.close();
    }
}
