//! Audio output seams - [`AudioSink`] / [`AudioOutput`] traits plus the
//! local `rodio` implementation.
//!
//! The scheduler and controller never talk to an audio device directly;
//! they see a per-session [`AudioSink`] handed out by an
//! [`AudioOutput`] factory. The production implementation is
//! [`LocalAudioOutput`](local::LocalAudioOutput); tests substitute
//! recording fakes.
//!
//! Both traits are **object-safe** (`Arc<dyn AudioSink>`,
//! `Arc<dyn AudioOutput>`). All methods take `&self`; interior
//! mutability (channels, atomic flags) handles state changes inside
//! each implementation.

pub mod local;

pub use local::LocalAudioOutput;

use crate::error::SpeechError;

/// Callback invoked exactly once when a session's playback ends,
/// whether it drained naturally or was stopped.
pub type DrainCallback = Box<dyn FnOnce() + Send + 'static>;

/// One session's audio output queue.
///
/// Sources enqueued here play strictly in order, back-to-back. A sink
/// belongs to exactly one read-aloud session; the next session gets a
/// fresh one from the [`AudioOutput`] factory.
pub trait AudioSink: Send + Sync {
    /// Queue mono samples for playback after everything enqueued
    /// before them.
    fn enqueue(&self, samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeechError>;

    /// Halt playback immediately, discarding anything still queued.
    /// Safe to call repeatedly and on a drained sink.
    fn stop(&self);

    /// Whether this session's sink is still live (not stopped and not
    /// naturally drained after a drain watch fired).
    fn is_active(&self) -> bool;

    /// Register a one-shot callback that fires when playback ends -
    /// on natural drain or on [`stop`](AudioSink::stop). Fires
    /// immediately when the queue is already empty.
    ///
    /// `on_drained` must be `Send + 'static` because it is dispatched
    /// from a background watcher thread.
    fn watch_drain(&self, on_drained: DrainCallback);
}

/// Factory for per-session sinks.
///
/// Opening a new session implicitly stops whatever the previous
/// session's sink was still playing - the output device belongs to one
/// session at a time.
pub trait AudioOutput: Send + Sync {
    /// Open a fresh sink for a new session.
    fn open_session(&self) -> Result<std::sync::Arc<dyn AudioSink>, SpeechError>;
}
