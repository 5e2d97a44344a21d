//! # Audio Normalization
//!
//! Turns an uploaded audio blob into the fixed representation the model
//! consumes: single-channel f32 samples at 16 kHz, bounded in duration.
//!
//! ## Pipeline:
//! 1. **Decode** (`decoder`): container/codec decoding via symphonia, with
//!    channel downmix to mono.
//! 2. **Duration check**: `sample_count / source_rate` measured right after
//!    decode. Resampling preserves duration, so checking at the source rate
//!    avoids resampling clips that will be rejected anyway.
//! 3. **Resample** (`resampler`): rubato sinc resampling to 16 kHz, skipped
//!    when the source is already 16 kHz.

pub mod decoder;
pub mod resampler;

use crate::error::{AppError, AppResult};

/// Sample rate the model expects, in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Normalize uploaded audio bytes to 16 kHz mono f32 samples.
///
/// Rejects clips longer than `max_clip_secs` before any resampling work and
/// before the model is ever invoked.
pub fn normalize_upload(bytes: &[u8], max_clip_secs: u64) -> AppResult<Vec<f32>> {
    let decoded = decoder::decode(bytes)?;

    let duration_secs = decoded.samples.len() as f64 / decoded.sample_rate as f64;
    if duration_secs > max_clip_secs as f64 {
        return Err(AppError::AudioTooLong {
            limit_secs: max_clip_secs,
        });
    }

    tracing::debug!(
        source_rate = decoded.sample_rate,
        duration_secs = format!("{:.2}", duration_secs).as_str(),
        "Decoded upload"
    );

    if decoded.sample_rate == TARGET_SAMPLE_RATE {
        return Ok(decoded.samples);
    }

    resampler::resample(&decoded.samples, decoded.sample_rate, TARGET_SAMPLE_RATE)
}

/// Synthetic WAV fixtures for the audio tests.
#[cfg(test)]
pub(crate) mod test_support {
    use byteorder::{LittleEndian, WriteBytesExt};

    /// Build an in-memory PCM WAV file containing a sine tone.
    pub fn sine_wav(sample_rate: u32, channels: u16, num_frames: u32) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align = channels * bits_per_sample / 8;
        let byte_rate = sample_rate * u32::from(block_align);
        let data_size = num_frames * u32::from(block_align);

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.write_u32::<LittleEndian>(36 + data_size).unwrap();
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.write_u32::<LittleEndian>(16).unwrap();
        buf.write_u16::<LittleEndian>(1).unwrap(); // PCM
        buf.write_u16::<LittleEndian>(channels).unwrap();
        buf.write_u32::<LittleEndian>(sample_rate).unwrap();
        buf.write_u32::<LittleEndian>(byte_rate).unwrap();
        buf.write_u16::<LittleEndian>(block_align).unwrap();
        buf.write_u16::<LittleEndian>(bits_per_sample).unwrap();
        buf.extend_from_slice(b"data");
        buf.write_u32::<LittleEndian>(data_size).unwrap();

        for frame in 0..num_frames {
            let t = frame as f32 / sample_rate as f32;
            let sample = ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 12000.0) as i16;
            for _ in 0..channels {
                buf.write_i16::<LittleEndian>(sample).unwrap();
            }
        }

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_16khz_skips_resampling() {
        // 0.5s at 16kHz: sample count must be preserved exactly
        let wav = test_support::sine_wav(16_000, 1, 8_000);
        let samples = normalize_upload(&wav, 15).unwrap();
        assert_eq!(samples.len(), 8_000);
    }

    #[test]
    fn test_normalize_resamples_8khz_input() {
        // 1s at 8kHz becomes ~1s at 16kHz
        let wav = test_support::sine_wav(8_000, 1, 8_000);
        let samples = normalize_upload(&wav, 15).unwrap();
        let ratio = samples.len() as f64 / 16_000.0;
        assert!((ratio - 1.0).abs() < 0.05, "got {} samples", samples.len());
    }

    #[test]
    fn test_normalize_downmixes_stereo() {
        let wav = test_support::sine_wav(16_000, 2, 4_000);
        let samples = normalize_upload(&wav, 15).unwrap();
        assert_eq!(samples.len(), 4_000);
    }

    #[test]
    fn test_normalize_rejects_long_clip() {
        // 16s at 8kHz: rejected at the source rate, before resampling
        let wav = test_support::sine_wav(8_000, 1, 8_000 * 16);
        let err = normalize_upload(&wav, 15).unwrap_err();
        assert_eq!(err.to_string(), "Audio is too long (>15s)");
    }

    #[test]
    fn test_normalize_accepts_clip_at_limit() {
        let wav = test_support::sine_wav(16_000, 1, 16_000 * 15);
        assert!(normalize_upload(&wav, 15).is_ok());
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = normalize_upload(b"definitely not audio", 15).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }
}
