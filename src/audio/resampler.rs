//! Sample-rate conversion via rubato.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::AppError;

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `from_rate` to `to_rate`.
///
/// The input is processed in fixed-size chunks; the final chunk is
/// zero-padded and the output trimmed back to the expected length so padding
/// never adds trailing samples.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AppError> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = f64::from(to_rate) / f64::from(from_rate);

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1)
        .map_err(|e| AppError::Resample(format!("resampler init: {}", e)))?;

    let expected_len = (samples.len() as f64 * ratio).round() as usize;
    let mut output = Vec::with_capacity(expected_len + CHUNK_SIZE);

    for chunk in samples.chunks(CHUNK_SIZE) {
        let input = if chunk.len() < CHUNK_SIZE {
            let mut padded = chunk.to_vec();
            padded.resize(CHUNK_SIZE, 0.0);
            vec![padded]
        } else {
            vec![chunk.to_vec()]
        };

        let resampled = resampler
            .process(&input, None)
            .map_err(|e| AppError::Resample(format!("resampler process: {}", e)))?;

        if let Some(channel) = resampled.into_iter().next() {
            output.extend(channel);
        }
    }

    output.truncate(expected_len);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(rate: u32, secs: f32) -> Vec<f32> {
        let n = (rate as f32 * secs) as usize;
        (0..n)
            .map(|i| (i as f32 / rate as f32 * 440.0 * 2.0 * std::f32::consts::PI).sin())
            .collect()
    }

    #[test]
    fn test_same_rate_is_identity() {
        let samples = sine(16_000, 0.5);
        let out = resample(&samples, 16_000, 16_000).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn test_downsample_48k_to_16k() {
        let samples = sine(48_000, 1.0);
        let out = resample(&samples, 48_000, 16_000).unwrap();
        let ratio = out.len() as f64 / samples.len() as f64;
        assert!((ratio - 1.0 / 3.0).abs() < 0.02, "ratio: {}", ratio);
    }

    #[test]
    fn test_upsample_8k_to_16k() {
        let samples = sine(8_000, 1.0);
        let out = resample(&samples, 8_000, 16_000).unwrap();
        let ratio = out.len() as f64 / samples.len() as f64;
        assert!((ratio - 2.0).abs() < 0.05, "ratio: {}", ratio);
    }

    #[test]
    fn test_output_trimmed_to_expected_length() {
        // 1.3 chunks of input: padding must not leak into the output length
        let samples = sine(44_100, 0.03);
        let out = resample(&samples, 44_100, 16_000).unwrap();
        let expected = (samples.len() as f64 * 16_000.0 / 44_100.0).round() as usize;
        assert_eq!(out.len(), expected);
    }
}
