//! # Whisper Model Loading and Inference
//!
//! Loads the pretrained Akan Whisper checkpoint with Candle-rs and runs
//! greedy transcription over 16 kHz mono samples.
//!
//! ## Loading process:
//! 1. Fetch `config.json`, `tokenizer.json`, and `model.safetensors` from the
//!    configured Hugging Face repository (cached locally by hf-hub)
//! 2. Build the mel filterbank for the checkpoint's `num_mel_bins`
//! 3. Resolve the decoder prompt tokens through the tokenizer
//! 4. Memory-map the weights and construct the model
//!
//! Inference is forced to the transcribe task (no translation, no
//! timestamps) and decodes greedily with the cross-attention KV cache
//! enabled, up to a fixed output token cap.

use candle_core::{Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, audio, Config};
use hf_hub::api::tokio::ApiBuilder;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use anyhow::{anyhow, Result};

/// Hard cap on generated tokens per clip.
///
/// Clips are at most 15 seconds, which fits comfortably in 50 tokens; the
/// cap also bounds runaway repetition.
const MAX_TARGET_TOKENS: usize = 50;

/// Decoder prompt resolved from the tokenizer at load time.
#[derive(Debug, Clone, Copy)]
struct PromptTokens {
    sot: u32,
    eot: u32,
    transcribe: u32,
    no_timestamps: u32,
}

/// A loaded Whisper checkpoint ready for transcription.
///
/// Decoding mutates the model's internal KV caches, so `transcribe` takes
/// `&mut self`; callers serialize access behind a lock.
pub struct WhisperModel {
    model: m::model::Whisper,
    config: Config,
    device: Device,
    tokenizer: Tokenizer,
    mel_filters: Vec<f32>,
    prompt: PromptTokens,
}

impl WhisperModel {
    /// Download (or reuse from cache) and load the checkpoint.
    pub async fn load(repo_id: &str, revision: &str, device: Device) -> Result<Self> {
        tracing::info!(repo = repo_id, revision, "Loading Whisper checkpoint");
        let start_time = std::time::Instant::now();

        let api = ApiBuilder::new()
            .with_progress(false)
            .build()
            .map_err(|e| anyhow!("Failed to initialize Hugging Face API client: {}", e))?;

        let repo = api.repo(Repo::with_revision(
            repo_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        let config_filename = repo
            .get("config.json")
            .await
            .map_err(|e| anyhow!("Failed to download config.json from {}: {}", repo_id, e))?;
        let tokenizer_filename = repo
            .get("tokenizer.json")
            .await
            .map_err(|e| anyhow!("Failed to download tokenizer.json from {}: {}", repo_id, e))?;
        let weights_filename = repo
            .get("model.safetensors")
            .await
            .map_err(|e| anyhow!("Failed to download model weights from {}: {}", repo_id, e))?;

        let config: Config = serde_json::from_reader(std::fs::File::open(config_filename)?)?;

        let tokenizer = Tokenizer::from_file(tokenizer_filename)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

        let prompt = PromptTokens {
            sot: token_id(&tokenizer, m::SOT_TOKEN)?,
            eot: token_id(&tokenizer, m::EOT_TOKEN)?,
            transcribe: token_id(&tokenizer, m::TRANSCRIBE_TOKEN)?,
            no_timestamps: token_id(&tokenizer, m::NO_TIMESTAMPS_TOKEN)?,
        };

        let mel_filters = mel_filterbank(
            config.num_mel_bins,
            m::N_FFT,
            m::SAMPLE_RATE as f32,
        );

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_filename], m::DTYPE, &device)?
        };
        let model = m::model::Whisper::load(&vb, config.clone())?;

        tracing::info!(
            repo = repo_id,
            mel_bins = config.num_mel_bins,
            "Whisper checkpoint loaded in {:.2}s",
            start_time.elapsed().as_secs_f64()
        );

        Ok(Self {
            model,
            config,
            device,
            tokenizer,
            mel_filters,
            prompt,
        })
    }

    /// Transcribe 16 kHz mono samples to text.
    ///
    /// Runs feature extraction, the encoder, and a greedy decode loop forced
    /// to the transcribe task. Special tokens are stripped from the output.
    pub fn transcribe(&mut self, samples: &[f32]) -> Result<String> {
        if samples.is_empty() {
            return Err(anyhow!("Audio data is empty"));
        }

        // Log-mel features; pcm_to_mel pads/truncates to the model's 30s window.
        let mel = audio::pcm_to_mel(&self.config, samples, &self.mel_filters);
        let mel_len = mel.len();
        let n_mels = self.config.num_mel_bins;
        let mel = Tensor::from_vec(mel, (1, n_mels, mel_len / n_mels), &self.device)?;

        let audio_features = self.model.encoder.forward(&mel, true)?;

        // Forced decoder prompt: transcribe task, no timestamps.
        let mut tokens = vec![self.prompt.sot, self.prompt.transcribe, self.prompt.no_timestamps];
        let prompt_len = tokens.len();

        for step in 0..MAX_TARGET_TOKENS {
            let tokens_t = Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?;

            // Flush the cross-attention KV cache on the first step only; later
            // steps reuse it.
            let ys = self
                .model
                .decoder
                .forward(&tokens_t, &audio_features, step == 0)?;

            let (_, seq_len, _) = ys.dims3()?;
            let logits = self
                .model
                .decoder
                .final_linear(&ys.i((..1, seq_len - 1..))?)?
                .i(0)?
                .i(0)?;

            let next_token = logits.argmax(0)?.to_scalar::<u32>()?;

            if next_token == self.prompt.eot {
                break;
            }

            tokens.push(next_token);
        }

        let output_tokens = &tokens[prompt_len..];
        let text = self
            .tokenizer
            .decode(output_tokens, true)
            .map_err(|e| anyhow!("Tokenizer decode error: {}", e))?;

        Ok(text.trim().to_string())
    }
}

/// Resolve a special token string to its id.
fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32> {
    tokenizer
        .token_to_id(token)
        .ok_or_else(|| anyhow!("Tokenizer has no token {}", token))
}

/// Build a triangular mel filterbank, `n_mels x (n_fft / 2 + 1)` row-major.
///
/// HTK mel scale with area normalization per filter. Shapes match what
/// `whisper::audio::pcm_to_mel` expects.
fn mel_filterbank(n_mels: usize, n_fft: usize, sample_rate: f32) -> Vec<f32> {
    let n_freqs = n_fft / 2 + 1;
    let f_max = sample_rate / 2.0;

    let hz_to_mel = |hz: f32| 2595.0 * (1.0 + hz / 700.0).log10();
    let mel_to_hz = |mel: f32| 700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0);

    let mel_max = hz_to_mel(f_max);
    let band_edges: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
        .collect();

    let mut filters = vec![0.0_f32; n_mels * n_freqs];
    for mel_bin in 0..n_mels {
        let f_left = band_edges[mel_bin];
        let f_center = band_edges[mel_bin + 1];
        let f_right = band_edges[mel_bin + 2];
        let norm = 2.0 / (f_right - f_left);

        for freq_bin in 0..n_freqs {
            let freq = freq_bin as f32 * sample_rate / n_fft as f32;
            let weight = if freq <= f_left || freq >= f_right {
                0.0
            } else if freq <= f_center {
                (freq - f_left) / (f_center - f_left)
            } else {
                (f_right - freq) / (f_right - f_center)
            };
            filters[mel_bin * n_freqs + freq_bin] = weight * norm;
        }
    }

    filters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filterbank_shape() {
        let filters = mel_filterbank(80, 400, 16000.0);
        assert_eq!(filters.len(), 80 * 201);
    }

    #[test]
    fn test_filterbank_rows_are_triangular() {
        let n_freqs = 201;
        let filters = mel_filterbank(80, 400, 16000.0);

        for mel_bin in 0..80 {
            let row = &filters[mel_bin * n_freqs..(mel_bin + 1) * n_freqs];
            // every filter has support somewhere
            assert!(
                row.iter().any(|&w| w > 0.0),
                "mel bin {} has no support",
                mel_bin
            );
            // weights are non-negative and finite
            assert!(row.iter().all(|&w| w >= 0.0 && w.is_finite()));
        }
    }

    #[test]
    fn test_filterbank_bands_ascend() {
        let n_freqs = 201;
        let filters = mel_filterbank(80, 400, 16000.0);

        let peak_bin = |mel_bin: usize| {
            let row = &filters[mel_bin * n_freqs..(mel_bin + 1) * n_freqs];
            row.iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap()
        };

        // filter centers move up in frequency
        assert!(peak_bin(0) < peak_bin(40));
        assert!(peak_bin(40) < peak_bin(79));
    }
}
