//! Audio frame decoding - base64 PCM16LE chunks to normalized samples.
//!
//! The speech service streams mono PCM as signed 16-bit little-endian
//! samples, base64-encoded inside a JSON envelope. [`decode_chunk`]
//! turns one chunk into an [`AudioFrame`] of `f32` samples in
//! `[-1.0, 1.0)`; [`encode_pcm16`] is the exact inverse for valid
//! inputs. Decoding is a pure transformation - a bad chunk is an error
//! for the caller to skip, never a crash.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use crate::error::SpeechError;

/// Sampling rate assumed when the wire omits one.
pub const DEFAULT_SAMPLING_RATE_HZ: u32 = 22_050;

const fn default_sampling_rate() -> u32 {
    DEFAULT_SAMPLING_RATE_HZ
}

/// One audio chunk as it arrives from the speech service.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioChunk {
    /// Base64-encoded PCM16LE mono samples.
    pub audio: String,

    /// Sampling rate in Hz. Defaults to 22 050 when absent.
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: u32,
}

/// A decoded, immutable audio frame owned by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Normalized amplitudes in `[-1.0, 1.0)`, one per source sample
    /// pair, in arrival order.
    pub samples: Vec<f32>,

    /// Sampling rate in Hz.
    pub sample_rate: u32,
}

impl AudioFrame {
    /// Playback duration of this frame in seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let samples = self.samples.len() as f64;
        samples / f64::from(self.sample_rate)
    }

    /// `true` when the frame carries no audio.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Decode one chunk into a normalized frame.
///
/// Each little-endian byte pair is read as an `i16` and divided by
/// 32 768. Malformed base64, an odd byte count, or a zero sampling
/// rate yield [`SpeechError::Decode`].
pub fn decode_chunk(chunk: &AudioChunk) -> Result<AudioFrame, SpeechError> {
    if chunk.sampling_rate == 0 {
        return Err(SpeechError::Decode(
            "sampling rate must be positive".to_string(),
        ));
    }

    let bytes = BASE64
        .decode(&chunk.audio)
        .map_err(|e| SpeechError::Decode(format!("invalid base64 payload: {e}")))?;

    if bytes.len() % 2 != 0 {
        return Err(SpeechError::Decode(format!(
            "PCM16 payload has odd length {}",
            bytes.len()
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32_768.0)
        .collect();

    Ok(AudioFrame {
        samples,
        sample_rate: chunk.sampling_rate,
    })
}

/// Encode normalized samples back to PCM16LE bytes.
///
/// Exact inverse of [`decode_chunk`] for values produced by it; inputs
/// outside the i16 range are clamped.
#[must_use]
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        #[allow(clippy::cast_possible_truncation)]
        let value = (f64::from(s) * 32_768.0).clamp(-32_768.0, 32_767.0) as i16;
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_from_bytes(bytes: &[u8], sampling_rate: u32) -> AudioChunk {
        AudioChunk {
            audio: BASE64.encode(bytes),
            sampling_rate,
        }
    }

    #[test]
    fn decodes_samples_in_order() {
        // 0x0001, -1, i16::MAX, i16::MIN as little-endian pairs
        let bytes: Vec<u8> = [1i16, -1, i16::MAX, i16::MIN]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let frame = decode_chunk(&chunk_from_bytes(&bytes, 22_050)).unwrap();

        assert_eq!(frame.samples.len(), 4);
        assert!((frame.samples[0] - 1.0 / 32_768.0).abs() < f32::EPSILON);
        assert!((frame.samples[1] + 1.0 / 32_768.0).abs() < f32::EPSILON);
        assert!((frame.samples[2] - 32_767.0 / 32_768.0).abs() < f32::EPSILON);
        assert!((frame.samples[3] + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn all_samples_stay_in_range() {
        let bytes: Vec<u8> = (-4i16..4).flat_map(|s| (s * 8191).to_le_bytes()).collect();
        let frame = decode_chunk(&chunk_from_bytes(&bytes, 22_050)).unwrap();
        assert!(frame.samples.iter().all(|&s| (-1.0..1.0).contains(&s)));
    }

    #[test]
    fn round_trip_reproduces_the_original_bytes() {
        let bytes: Vec<u8> = [0i16, 1, -1, 1000, -1000, i16::MAX, i16::MIN, 12_345]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let frame = decode_chunk(&chunk_from_bytes(&bytes, 22_050)).unwrap();
        assert_eq!(encode_pcm16(&frame.samples), bytes);
    }

    #[test]
    fn hundred_unit_samples_last_about_4_5_ms() {
        // 100 samples of 0x0001 at 22 050 Hz - the canonical scenario.
        let bytes: Vec<u8> = std::iter::repeat_n([0x01, 0x00], 100).flatten().collect();
        let frame = decode_chunk(&chunk_from_bytes(&bytes, 22_050)).unwrap();

        assert_eq!(frame.samples.len(), 100);
        assert!(frame.samples.iter().all(|&s| s == 1.0 / 32_768.0));
        assert!((frame.duration_seconds() - 100.0 / 22_050.0).abs() < 1e-9);
    }

    #[test]
    fn empty_payload_decodes_to_an_empty_frame() {
        let frame = decode_chunk(&chunk_from_bytes(&[], 22_050)).unwrap();
        assert!(frame.is_empty());
        assert!(frame.duration_seconds().abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_invalid_base64() {
        let chunk = AudioChunk {
            audio: "not base64!!!".to_string(),
            sampling_rate: 22_050,
        };
        assert!(matches!(decode_chunk(&chunk), Err(SpeechError::Decode(_))));
    }

    #[test]
    fn rejects_odd_byte_length() {
        let chunk = chunk_from_bytes(&[0x01, 0x00, 0x02], 22_050);
        assert!(matches!(decode_chunk(&chunk), Err(SpeechError::Decode(_))));
    }

    #[test]
    fn rejects_zero_sampling_rate() {
        let chunk = chunk_from_bytes(&[0x01, 0x00], 0);
        assert!(matches!(decode_chunk(&chunk), Err(SpeechError::Decode(_))));
    }

    #[test]
    fn missing_sampling_rate_defaults_to_22050() {
        let chunk: AudioChunk = serde_json::from_str(r#"{"audio":"AAA="}"#).unwrap();
        assert_eq!(chunk.sampling_rate, DEFAULT_SAMPLING_RATE_HZ);
    }

    #[test]
    fn encode_clamps_out_of_range_floats() {
        let bytes = encode_pcm16(&[2.0, -2.0]);
        assert_eq!(bytes, [0xFF, 0x7F, 0x00, 0x80]);
    }
}
