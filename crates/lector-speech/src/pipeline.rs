//! Read-aloud controller - the public start/cancel state machine.
//!
//! ```text
//!   Idle → Connecting → Reading → Completed → Idle
//!            │            │
//!            └── start()──┴──→ Canceling → Idle   (toggle / cancel)
//!            └────────────┴──→ Errored  → Idle   (transport/output failure)
//! ```
//!
//! One logical session at a time. The session is a single task
//! consuming the transport's event channel in order, so frames are
//! decoded and scheduled strictly sequentially and the timeline cursor
//! advances without locks. Cancellation is cooperative: a flag checked
//! before each scheduling step plus best-effort interruption of queued
//! audio, safe to request concurrently with an in-flight chunk.
//!
//! Completion is gated on playback, not on the network: the transport
//! closing marks end-of-stream, but `Completed` fires only once the
//! last scheduled frame has finished playing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use lector_core::events::{AlertSeverity, AppEvent};
use lector_core::settings::{Settings, validate_for_reading};

use crate::decode::decode_chunk;
use crate::error::SpeechError;
use crate::sink::{AudioOutput, AudioSink};
use crate::stream::{
    DEFAULT_SPEECH_HOST, STOP_COMMAND, SpeechTransport, StreamControl, StreamEvent, StreamParams,
};
use crate::timeline::PlaybackScheduler;

// ── Reader state machine ───────────────────────────────────────────

/// Current state of the read-aloud controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReaderState {
    /// No session active.
    Idle,

    /// Transport opening; no audio heard yet.
    Connecting,

    /// Audio is streaming and playing.
    Reading,

    /// User-requested teardown in progress.
    Canceling,

    /// The stream ended and the last frame finished playing.
    /// Self-resets to [`Idle`](Self::Idle).
    Completed,

    /// The session failed. Self-resets to [`Idle`](Self::Idle); the
    /// user must start again, nothing is retried.
    Errored,
}

impl ReaderState {
    /// Short lowercase label for logs and UI payloads.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Reading => "reading",
            Self::Canceling => "canceling",
            Self::Completed => "completed",
            Self::Errored => "errored",
        }
    }

    /// `true` while a session is underway - the window in which the
    /// single read control acts as "stop".
    #[must_use]
    pub const fn is_reading(self) -> bool {
        matches!(self, Self::Connecting | Self::Reading)
    }
}

// ── Events emitted by the pipeline ─────────────────────────────────

/// Events emitted by the controller to the UI / application layer.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Controller state changed.
    StateChanged(ReaderState),

    /// The first audio frame of the session was scheduled.
    ReadingStarted,

    /// A frame was scheduled; the timeline cursor moved.
    Progress {
        /// Cursor position in seconds from session start.
        cursor_seconds: f64,
    },

    /// A user-facing alert.
    Alert {
        severity: AlertSeverity,
        message: String,
    },
}

impl PipelineEvent {
    /// Bridge to the canonical UI event union.
    #[must_use]
    pub fn ui_event(&self) -> AppEvent {
        match self {
            Self::StateChanged(state) => AppEvent::ReadingStateChanged {
                is_reading: state.is_reading(),
                state: state.label().to_string(),
            },
            Self::ReadingStarted => AppEvent::ReadingStarted,
            Self::Progress { cursor_seconds } => AppEvent::ReadingProgress {
                cursor_seconds: *cursor_seconds,
            },
            Self::Alert { severity, message } => AppEvent::Alert {
                severity: *severity,
                message: message.clone(),
            },
        }
    }

    fn from_error(error: &SpeechError) -> Self {
        Self::Alert {
            severity: error.severity(),
            message: error.to_string(),
        }
    }
}

// ── Configuration ──────────────────────────────────────────────────

/// Per-controller configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Speech service host.
    pub host: String,

    /// Playback speed multiplier, clamped to 0.5-2.0 at session
    /// start.
    pub speed: f32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPEECH_HOST.to_string(),
            speed: 1.0,
        }
    }
}

// ── Controller ─────────────────────────────────────────────────────

/// State cell plus event channel, shared with the session task.
#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<ReaderState>>,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl Shared {
    fn state(&self) -> ReaderState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, new_state: ReaderState) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *state == new_state {
            return;
        }
        tracing::debug!(from = ?*state, to = ?new_state, "reader state");
        *state = new_state;
        drop(state);
        self.emit(PipelineEvent::StateChanged(new_state));
    }

    fn emit(&self, event: PipelineEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("pipeline event receiver dropped");
        }
    }
}

/// Resources owned by one read-aloud session.
struct ActiveSession {
    cancel: Arc<AtomicBool>,
    control: StreamControl,
    sink: Arc<dyn AudioSink>,
    task: tokio::task::JoinHandle<()>,
}

/// The read-aloud controller.
///
/// Holds the transport and audio-output seams; each
/// [`start`](Self::start) opens a fresh session against them. Emits
/// [`PipelineEvent`]s via the channel returned from
/// [`new`](Self::new).
pub struct ReaderPipeline {
    transport: Arc<dyn SpeechTransport>,
    output: Arc<dyn AudioOutput>,
    config: ReaderConfig,
    shared: Shared,
    session: Mutex<Option<ActiveSession>>,
}

impl ReaderPipeline {
    /// Create a controller and the receiver for its events.
    #[must_use]
    pub fn new(
        transport: Arc<dyn SpeechTransport>,
        output: Arc<dyn AudioOutput>,
        config: ReaderConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let pipeline = Self {
            transport,
            output,
            config,
            shared: Shared {
                state: Arc::new(Mutex::new(ReaderState::Idle)),
                event_tx,
            },
            session: Mutex::new(None),
        };
        (pipeline, event_rx)
    }

    /// Current controller state.
    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.shared.state()
    }

    /// `true` while a session is underway.
    #[must_use]
    pub fn is_reading(&self) -> bool {
        self.state().is_reading()
    }

    /// Start reading `text` aloud, or cancel the session already
    /// underway (the single control doubles as start/stop).
    ///
    /// Fails fast - before any transport or device is touched - with
    /// [`SpeechError::Configuration`] when settings are incomplete and
    /// [`SpeechError::NoInput`] when the text is empty.
    pub async fn start(&self, text: &str, settings: &Settings) -> Result<(), SpeechError> {
        if self.is_reading() {
            tracing::info!("read control toggled - cancelling current session");
            self.cancel();
            return Ok(());
        }

        validate_for_reading(settings)?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(SpeechError::NoInput);
        }

        // A finished session may still hold released resources.
        self.take_session();

        let sink = self.output.open_session()?;
        let params = StreamParams {
            host: self.config.host.clone(),
            language: settings.language.clone(),
            voice_id: settings.voice.id.clone(),
            speed: self.config.speed.clamp(0.5, 2.0),
            api_key: settings.api_key.clone(),
        };

        tracing::info!(
            chars = text.len(),
            voice = %settings.voice.name,
            language = %params.language,
            "starting read-aloud session"
        );
        self.shared.set_state(ReaderState::Connecting);

        let (control, events) = match self.transport.open(&params).await {
            Ok(pair) => pair,
            Err(e) => {
                sink.stop();
                self.shared.emit(PipelineEvent::from_error(&e));
                self.shared.set_state(ReaderState::Errored);
                self.shared.set_state(ReaderState::Idle);
                return Err(e);
            }
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_session(
            self.shared.clone(),
            Arc::clone(&cancel),
            control.clone(),
            Arc::clone(&sink),
            events,
            text,
        ));

        *self
            .session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(ActiveSession {
            cancel,
            control,
            sink,
            task,
        });
        Ok(())
    }

    /// Cancel the active session, if any.
    ///
    /// Closes the transport, halts in-flight audio, and discards the
    /// timeline. Always ends in [`ReaderState::Idle`], from any state,
    /// idempotently.
    pub fn cancel(&self) {
        if let Some(session) = self.take_session() {
            tracing::info!("cancelling read-aloud session");
            self.shared.set_state(ReaderState::Canceling);
            session.cancel.store(true, Ordering::SeqCst);
            session.control.close();
            session.sink.stop();
            // The task observes the flag (or the drain firing) and
            // exits on its own.
        }
        self.shared.set_state(ReaderState::Idle);
    }

    fn take_session(&self) -> Option<ActiveSession> {
        self.session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }
}

impl Drop for ReaderPipeline {
    fn drop(&mut self) {
        if let Some(session) = self.take_session() {
            session.cancel.store(true, Ordering::SeqCst);
            session.control.close();
            session.sink.stop();
            session.task.abort();
        }
    }
}

// ── Session task ───────────────────────────────────────────────────

/// Why the event loop ended.
enum SessionOutcome {
    /// Transport closed normally - end of stream.
    Closed,
    /// Transport (or send) failed.
    Failed(String),
    /// Scheduling hit the audio output.
    OutputFailed(SpeechError),
    /// Cancelled, or the transport task vanished; the cancel path owns
    /// state and resources.
    Detached,
}

/// Consume stream events in arrival order: decode, schedule, and
/// finally gate completion on the sink draining.
async fn run_session(
    shared: Shared,
    cancel: Arc<AtomicBool>,
    control: StreamControl,
    sink: Arc<dyn AudioSink>,
    mut events: mpsc::UnboundedReceiver<StreamEvent>,
    text: String,
) {
    let mut scheduler = PlaybackScheduler::new(Arc::clone(&sink));
    let mut last_handle = None;
    let mut skipped_chunks: usize = 0;

    let outcome = loop {
        let Some(event) = events.recv().await else {
            break SessionOutcome::Detached;
        };
        if cancel.load(Ordering::SeqCst) {
            // Anything arriving after cancellation is dropped, never
            // scheduled.
            break SessionOutcome::Detached;
        }

        match event {
            StreamEvent::Opened => {
                control.send(text.clone());
                control.send(STOP_COMMAND);
            }

            StreamEvent::Chunk(chunk) => match decode_chunk(&chunk) {
                Ok(frame) => {
                    if shared.state() == ReaderState::Connecting {
                        shared.set_state(ReaderState::Reading);
                        shared.emit(PipelineEvent::ReadingStarted);
                    }
                    if cancel.load(Ordering::SeqCst) {
                        break SessionOutcome::Detached;
                    }
                    match scheduler.schedule(frame) {
                        Ok(Some(handle)) => {
                            last_handle = Some(handle);
                            shared.emit(PipelineEvent::Progress {
                                cursor_seconds: scheduler.cursor_seconds(),
                            });
                        }
                        Ok(None) => {}
                        Err(e) => break SessionOutcome::OutputFailed(e),
                    }
                }
                Err(e) => {
                    // Contained: drop the chunk, keep the session.
                    skipped_chunks += 1;
                    tracing::warn!(error = %e, "skipping undecodable audio chunk");
                }
            },

            StreamEvent::Closed => break SessionOutcome::Closed,
            StreamEvent::Failed(reason) => break SessionOutcome::Failed(reason),
        }
    };

    if skipped_chunks > 0 {
        tracing::warn!(skipped_chunks, "session finished with undecodable chunks");
    }

    match outcome {
        SessionOutcome::Detached => {}

        SessionOutcome::Failed(reason) => {
            // Halt the in-flight unit through its handle, then tear
            // down the rest.
            if let Some(handle) = &last_handle {
                handle.cancel();
            }
            fail_session(&shared, &control, &*sink, &SpeechError::Transport(reason));
        }

        SessionOutcome::OutputFailed(error) => {
            fail_session(&shared, &control, &*sink, &error);
        }

        SessionOutcome::Closed => {
            // End of stream is not end of audio: wait for playback.
            let (drained_tx, drained_rx) = oneshot::channel();
            sink.watch_drain(Box::new(move || {
                let _ = drained_tx.send(());
            }));
            let _ = drained_rx.await;

            if !cancel.load(Ordering::SeqCst) {
                tracing::info!("read-aloud session completed");
                shared.set_state(ReaderState::Completed);
                shared.set_state(ReaderState::Idle);
            }
        }
    }
}

/// Abort the session: halt audio, close the transport, surface the
/// failure once, return to idle.
fn fail_session(shared: &Shared, control: &StreamControl, sink: &dyn AudioSink, error: &SpeechError) {
    sink.stop();
    control.close();
    tracing::warn!(error = %error, "read-aloud session failed");
    shared.emit(PipelineEvent::from_error(error));
    shared.set_state(ReaderState::Errored);
    shared.set_state(ReaderState::Idle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_lowercase_and_stable() {
        let cases = [
            (ReaderState::Idle, "idle"),
            (ReaderState::Connecting, "connecting"),
            (ReaderState::Reading, "reading"),
            (ReaderState::Canceling, "canceling"),
            (ReaderState::Completed, "completed"),
            (ReaderState::Errored, "errored"),
        ];
        for (state, label) in cases {
            assert_eq!(state.label(), label);
        }
    }

    #[test]
    fn only_live_session_states_count_as_reading() {
        assert!(ReaderState::Connecting.is_reading());
        assert!(ReaderState::Reading.is_reading());
        assert!(!ReaderState::Idle.is_reading());
        assert!(!ReaderState::Canceling.is_reading());
        assert!(!ReaderState::Completed.is_reading());
        assert!(!ReaderState::Errored.is_reading());
    }

    #[test]
    fn state_change_bridges_to_the_ui_union() {
        let event = PipelineEvent::StateChanged(ReaderState::Reading);
        match event.ui_event() {
            AppEvent::ReadingStateChanged { is_reading, state } => {
                assert!(is_reading);
                assert_eq!(state, "reading");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn alerts_bridge_with_severity() {
        let event = PipelineEvent::from_error(&SpeechError::NoInput);
        match event.ui_event() {
            AppEvent::Alert { severity, .. } => assert_eq!(severity, AlertSeverity::Info),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn default_config_points_at_the_service() {
        let config = ReaderConfig::default();
        assert_eq!(config.host, DEFAULT_SPEECH_HOST);
        assert!((config.speed - 1.0).abs() < f32::EPSILON);
    }
}
