#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod decode;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod stream;
pub mod timeline;
pub mod voices;

// Re-export key types for convenience
pub use decode::{AudioChunk, AudioFrame, DEFAULT_SAMPLING_RATE_HZ, decode_chunk, encode_pcm16};
pub use error::SpeechError;
pub use pipeline::{PipelineEvent, ReaderConfig, ReaderPipeline, ReaderState};
pub use sink::{AudioOutput, AudioSink, LocalAudioOutput};
pub use stream::{
    DEFAULT_SPEECH_HOST, STOP_COMMAND, SpeechTransport, StreamCommand, StreamControl, StreamEvent,
    StreamParams, WebSocketTransport,
};
pub use timeline::{FrameSchedule, PlaybackScheduler, PlaybackTimeline, ScheduledHandle};
pub use voices::{VoiceListing, VoicesApi, VoicesClient, list_voices};
