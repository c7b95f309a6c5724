//! Local audio output - `rodio` confined to a dedicated OS thread.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so the device
//! lives on one OS thread for its entire lifetime and every operation
//! travels through an [`OutputCommand`] channel. The public
//! [`LocalAudioOutput`] is the `Send + Sync` proxy the pipeline holds.
//!
//! Each session gets its own `rodio::Sink` tagged with a generation
//! number. Opening a session stops the previous sink and bumps the
//! generation, so commands from a cancelled session's stragglers are
//! recognized as stale and ignored - a new session can never be touched
//! through an old handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tracing::{debug, warn};

use super::{AudioOutput, AudioSink, DrainCallback};
use crate::error::SpeechError;

// ── Commands ───────────────────────────────────────────────────────

/// A command sent from a session handle to the audio thread.
enum OutputCommand {
    /// Stop the previous session's sink and create a fresh one.
    OpenSession {
        reply: mpsc::Sender<Result<u64, SpeechError>>,
    },

    /// Queue samples on the session's sink.
    Enqueue {
        generation: u64,
        samples: Vec<f32>,
        sample_rate: u32,
        reply: mpsc::Sender<Result<(), SpeechError>>,
    },

    /// Halt the session's playback immediately (fire-and-forget).
    Stop { generation: u64 },

    /// Query whether the session is still live.
    IsActive {
        generation: u64,
        reply: mpsc::Sender<bool>,
    },

    /// Spawn a watcher that fires `on_drained` when playback ends.
    WatchDrain {
        generation: u64,
        on_drained: DrainCallback,
    },

    /// Shut down the audio thread, releasing the device.
    Shutdown,
}

// ── Output (Send + Sync proxy) ─────────────────────────────────────

/// [`AudioOutput`] over the default local output device.
///
/// Spawning opens the device on a dedicated thread; dropping shuts the
/// thread down and releases it.
pub struct LocalAudioOutput {
    cmd_tx: mpsc::Sender<OutputCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl LocalAudioOutput {
    /// Open the default output device.
    ///
    /// Fails with [`SpeechError::Output`] when no usable device exists,
    /// without touching any other resource.
    pub fn new() -> Result<Self, SpeechError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<OutputCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), SpeechError>>();

        let thread = thread::Builder::new()
            .name("lector-audio".into())
            .spawn(move || run(&cmd_rx, &init_tx))
            .map_err(|e| SpeechError::Output(format!("failed to spawn audio thread: {e}")))?;

        // Wait for the audio thread to finish opening the device.
        init_rx
            .recv()
            .map_err(|_| SpeechError::Output("audio thread died during init".to_string()))??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }
}

impl AudioOutput for LocalAudioOutput {
    fn open_session(&self) -> Result<Arc<dyn AudioSink>, SpeechError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(OutputCommand::OpenSession { reply: tx })
            .map_err(|_| SpeechError::Output("audio thread died".to_string()))?;
        let generation = rx
            .recv()
            .map_err(|_| SpeechError::Output("audio thread died".to_string()))??;

        debug!(generation, "audio session opened");
        Ok(Arc::new(SessionSink {
            cmd_tx: self.cmd_tx.clone(),
            generation,
        }))
    }
}

impl Drop for LocalAudioOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(OutputCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ── Per-session sink handle ────────────────────────────────────────

/// `Send + Sync` handle to one session's sink on the audio thread.
struct SessionSink {
    cmd_tx: mpsc::Sender<OutputCommand>,
    generation: u64,
}

impl AudioSink for SessionSink {
    fn enqueue(&self, samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeechError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(OutputCommand::Enqueue {
                generation: self.generation,
                samples,
                sample_rate,
                reply: tx,
            })
            .map_err(|_| SpeechError::Output("audio thread died".to_string()))?;
        rx.recv()
            .map_err(|_| SpeechError::Output("audio thread died".to_string()))?
    }

    fn stop(&self) {
        let _ = self.cmd_tx.send(OutputCommand::Stop {
            generation: self.generation,
        });
    }

    fn is_active(&self) -> bool {
        let (tx, rx) = mpsc::channel();
        if self
            .cmd_tx
            .send(OutputCommand::IsActive {
                generation: self.generation,
                reply: tx,
            })
            .is_err()
        {
            return false;
        }
        rx.recv().unwrap_or(false)
    }

    fn watch_drain(&self, on_drained: DrainCallback) {
        if let Err(mpsc::SendError(cmd)) = self.cmd_tx.send(OutputCommand::WatchDrain {
            generation: self.generation,
            on_drained,
        }) {
            // Thread gone - playback has certainly ended.
            if let OutputCommand::WatchDrain { on_drained, .. } = cmd {
                on_drained();
            }
        }
    }
}

// ── Audio thread event loop ────────────────────────────────────────

/// The live session owned by the audio thread.
struct Session {
    generation: u64,
    sink: Arc<Sink>,
    /// Cleared by stop or by the drain watcher when playback ends.
    live: Arc<AtomicBool>,
}

impl Session {
    fn stop(&self) {
        self.sink.stop();
        self.live.store(false, Ordering::SeqCst);
    }
}

/// Body of the dedicated audio thread. Owns the `OutputStream` for its
/// entire lifetime - it never crosses a thread boundary.
fn run(cmd_rx: &mpsc::Receiver<OutputCommand>, init_tx: &mpsc::Sender<Result<(), SpeechError>>) {
    let (stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init_tx.send(Err(SpeechError::Output(e.to_string())));
            return;
        }
    };
    // Keep the device alive for the lifetime of the loop.
    let _stream = stream;

    if init_tx.send(Ok(())).is_err() {
        return;
    }

    let mut next_generation: u64 = 0;
    let mut session: Option<Session> = None;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            OutputCommand::OpenSession { reply } => {
                if let Some(previous) = session.take() {
                    previous.stop();
                }
                next_generation += 1;
                let result = Sink::try_new(&stream_handle)
                    .map_err(|e| SpeechError::Output(e.to_string()))
                    .map(|sink| {
                        session = Some(Session {
                            generation: next_generation,
                            sink: Arc::new(sink),
                            live: Arc::new(AtomicBool::new(true)),
                        });
                        next_generation
                    });
                let _ = reply.send(result);
            }

            OutputCommand::Enqueue {
                generation,
                samples,
                sample_rate,
                reply,
            } => {
                match current(&session, generation) {
                    Some(live) => live.sink.append(SamplesBuffer::new(1, sample_rate, samples)),
                    // Stale session - drop the audio silently.
                    None => debug!(generation, "dropping enqueue for stale session"),
                }
                let _ = reply.send(Ok(()));
            }

            OutputCommand::Stop { generation } => {
                if let Some(live) = current(&session, generation) {
                    live.stop();
                    debug!(generation, "audio session stopped");
                }
            }

            OutputCommand::IsActive { generation, reply } => {
                let active = current(&session, generation)
                    .is_some_and(|live| live.live.load(Ordering::SeqCst));
                let _ = reply.send(active);
            }

            OutputCommand::WatchDrain {
                generation,
                on_drained,
            } => match current(&session, generation) {
                Some(live) => spawn_drain_watcher(live, on_drained),
                // Stale session - its playback already ended.
                None => on_drained(),
            },

            OutputCommand::Shutdown => break,
        }
    }

    if let Some(previous) = session.take() {
        previous.stop();
    }
    debug!("audio thread shut down");
}

fn current(session: &Option<Session>, generation: u64) -> Option<&Session> {
    session.as_ref().filter(|s| s.generation == generation)
}

/// Block on the sink in a watcher thread and fire the callback when
/// playback ends.
///
/// `sleep_until_end()` returns when the queue drains naturally or when
/// `stop()` drops the queued sources, so the callback fires promptly in
/// both cases - and immediately when the queue is already empty, which
/// completion gating relies on for sessions that produced no audio.
fn spawn_drain_watcher(session: &Session, on_drained: DrainCallback) {
    let sink = Arc::clone(&session.sink);
    let live = Arc::clone(&session.live);

    let spawned = thread::Builder::new()
        .name("lector-audio-drain".into())
        .spawn(move || {
            sink.sleep_until_end();
            live.store(false, Ordering::SeqCst);
            on_drained();
        });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to spawn drain watcher");
    }
}
