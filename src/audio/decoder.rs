//! Audio decoding via symphonia.
//!
//! Decodes whatever container/codec the upload turns out to be (wav, flac,
//! mp3, m4a/aac) into interleaved f32 frames, then downmixes to mono. The
//! format is sniffed from the content itself; the client-supplied filename is
//! not trusted.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AppError;

/// Decoded audio: mono samples at the source sample rate.
#[derive(Debug)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decode an uploaded byte blob into mono f32 samples.
///
/// The sample rate is whatever the source carries; callers are responsible
/// for resampling to the model's rate.
pub fn decode(bytes: &[u8]) -> Result<DecodedAudio, AppError> {
    let cursor = Cursor::new(bytes.to_vec());
    let stream = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AppError::Decode(format!("unrecognized audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AppError::Decode("no audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| AppError::Decode("source does not declare a sample rate".to_string()))?;
    let channels = codec_params.channels.map_or(1, |c| c.count()).max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AppError::Decode(format!("codec init failed: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(AppError::Decode(format!("packet read failed: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| AppError::Decode(format!("frame decode failed: {}", e)))?;

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let interleaved = sample_buf.samples();

        if channels > 1 {
            for frame in interleaved.chunks(channels) {
                let mono: f32 = frame.iter().sum::<f32>() / channels as f32;
                samples.push(mono);
            }
        } else {
            samples.extend_from_slice(interleaved);
        }
    }

    if samples.is_empty() {
        return Err(AppError::Decode("no audio samples decoded".to_string()));
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::sine_wav;

    #[test]
    fn test_decode_mono_wav() {
        let wav = sine_wav(16_000, 1, 1_600);
        let decoded = decode(&wav).unwrap();
        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.samples.len(), 1_600);
        assert!(decoded.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_decode_stereo_downmixes() {
        let wav = sine_wav(44_100, 2, 4_410);
        let decoded = decode(&wav).unwrap();
        assert_eq!(decoded.sample_rate, 44_100);
        // one mono sample per frame, regardless of channel count
        assert_eq!(decoded.samples.len(), 4_410);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"not audio data"), Err(AppError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(matches!(decode(b""), Err(AppError::Decode(_))));
    }
}
