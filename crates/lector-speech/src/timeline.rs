//! Playback timeline and scheduler - gapless, ordered frame playback.
//!
//! The timeline is the explicit model of the output queue: a cursor
//! holding the absolute output time at which the next frame must begin.
//! Frames scheduled in arrival order play back-to-back with no gap and
//! no overlap because each schedule starts at
//! `max(clock_now, cursor)` and advances the cursor by exactly the
//! frame's duration.
//!
//! The scheduler enqueues frames onto an [`AudioSink`], which plays
//! appended sources strictly in order - enqueue order IS the physical
//! schedule. The timeline tracks start/end times for the invariants,
//! progress reporting, and cancellation handles on top of it.

use std::sync::Arc;
use std::time::Instant;

use tracing::trace;

use crate::decode::AudioFrame;
use crate::error::SpeechError;
use crate::sink::AudioSink;

/// Where one frame sits on the session's output clock, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSchedule {
    /// When the frame starts playing.
    pub start: f64,
    /// When the frame finishes playing.
    pub end: f64,
}

/// Cursor for the next frame's start time on the output clock.
///
/// Monotonically non-decreasing while a session is active. Mutated
/// only by [`PlaybackScheduler::schedule`]; each session starts a fresh
/// timeline, so a cancelled session's cursor can never leak into the
/// next one.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackTimeline {
    cursor: f64,
}

impl PlaybackTimeline {
    /// A timeline whose cursor sits at the output clock's current
    /// time.
    #[must_use]
    pub const fn starting_at(clock_now: f64) -> Self {
        Self { cursor: clock_now }
    }

    /// The time at which the next frame will begin.
    #[must_use]
    pub const fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Place a frame of `duration_seconds` on the timeline.
    ///
    /// The frame starts at `max(clock_now, cursor)` - immediately when
    /// the timeline is caught up, back-to-back after the previous frame
    /// when the output is still behind. Zero-duration frames are a
    /// no-op and leave the cursor untouched.
    pub fn schedule(&mut self, clock_now: f64, duration_seconds: f64) -> Option<FrameSchedule> {
        if duration_seconds <= 0.0 {
            return None;
        }
        let start = clock_now.max(self.cursor);
        let end = start + duration_seconds;
        self.cursor = end;
        Some(FrameSchedule { start, end })
    }
}

/// Cancellation handle for a scheduled frame.
///
/// Cancelling halts the unit if it is currently playing or pending -
/// along with everything queued behind it on the same session sink,
/// which is exactly session-teardown granularity. Cancelling a unit
/// that already finished playing stops a drained sink, a no-op.
pub struct ScheduledHandle {
    sink: Arc<dyn AudioSink>,
    schedule: FrameSchedule,
}

impl ScheduledHandle {
    /// Stop this unit's playback if it has not finished yet.
    pub fn cancel(&self) {
        self.sink.stop();
    }

    /// Where the frame was placed on the timeline.
    #[must_use]
    pub const fn schedule(&self) -> FrameSchedule {
        self.schedule
    }
}

/// Schedules decoded frames onto one session's sink and timeline.
///
/// One scheduler per session, driven by a single producer (the stream
/// consumer task), so cursor advancement is strictly sequential.
pub struct PlaybackScheduler {
    sink: Arc<dyn AudioSink>,
    timeline: PlaybackTimeline,
    session_start: Instant,
}

impl PlaybackScheduler {
    /// Create a scheduler for a fresh session.
    ///
    /// The output clock is seconds since this call; the timeline cursor
    /// starts at zero, i.e. the clock's current time.
    #[must_use]
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink,
            timeline: PlaybackTimeline::starting_at(0.0),
            session_start: Instant::now(),
        }
    }

    /// Enqueue `frame` for gapless playback after everything scheduled
    /// before it.
    ///
    /// Returns `Ok(None)` for an empty frame (nothing enqueued, cursor
    /// unchanged), otherwise the cancellation handle for the scheduled
    /// unit.
    pub fn schedule(&mut self, frame: AudioFrame) -> Result<Option<ScheduledHandle>, SpeechError> {
        let now = self.session_start.elapsed().as_secs_f64();
        let Some(schedule) = self.timeline.schedule(now, frame.duration_seconds()) else {
            return Ok(None);
        };

        self.sink.enqueue(frame.samples, frame.sample_rate)?;
        trace!(
            start = schedule.start,
            end = schedule.end,
            "frame scheduled"
        );

        Ok(Some(ScheduledHandle {
            sink: Arc::clone(&self.sink),
            schedule,
        }))
    }

    /// The timeline cursor, in seconds from session start.
    #[must_use]
    pub const fn cursor_seconds(&self) -> f64 {
        self.timeline.cursor()
    }
}
