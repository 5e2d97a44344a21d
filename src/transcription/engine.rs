//! # Transcription Engine
//!
//! Owns the loaded Whisper model for the lifetime of the process and exposes
//! the one capability request handlers need: samples in, text out.
//!
//! The model is loaded exactly once, before the HTTP listener binds, and is
//! shared read-mostly across workers. Whisper decoding mutates internal KV
//! caches, so inference itself is serialized behind an async mutex.

use crate::config::ModelConfig;
use crate::error::{AppError, AppResult};
use crate::transcription::model::WhisperModel;
use candle_core::Device;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

use anyhow::Result;

/// Confidence reported with every successful transcription.
///
/// Placeholder: NOT derived from decoder probabilities. Callers must not
/// treat it as calibrated.
pub const FIXED_CONFIDENCE: f32 = 0.9;

/// Engine-level counters, reported through the metrics endpoint.
#[derive(Debug, Default, Clone)]
pub struct EngineStats {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub total_processing_ms: u64,
}

impl EngineStats {
    pub fn average_processing_ms(&self) -> u64 {
        let completed = self.total_requests - self.failed_requests;
        if completed > 0 {
            self.total_processing_ms / completed
        } else {
            0
        }
    }
}

/// Process-wide transcription capability.
pub struct TranscriptionEngine {
    /// Inference takes `&mut` (KV cache), so requests serialize here.
    model: Mutex<WhisperModel>,
    stats: RwLock<EngineStats>,
    repo: String,
}

impl TranscriptionEngine {
    /// Load the configured checkpoint. A failure here is fatal: the caller
    /// (main) aborts startup instead of serving without a model.
    pub async fn load(config: &ModelConfig, device: Device) -> Result<Self> {
        let model = WhisperModel::load(&config.repo, &config.revision, device).await?;
        Ok(Self {
            model: Mutex::new(model),
            stats: RwLock::new(EngineStats::default()),
            repo: config.repo.clone(),
        })
    }

    /// Transcribe 16 kHz mono samples to raw (uncorrected) text.
    pub async fn transcribe(&self, samples: &[f32]) -> AppResult<String> {
        if samples.is_empty() {
            return Err(AppError::Inference("audio data is empty".to_string()));
        }

        let audio_secs = samples.len() as f64 / 16_000.0;
        let start_time = Instant::now();

        let result = {
            let mut model = self.model.lock().await;
            model.transcribe(samples)
        };

        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(text) => {
                {
                    let mut stats = self.stats.write().await;
                    stats.total_requests += 1;
                    stats.total_processing_ms += elapsed_ms;
                }
                tracing::info!(
                    audio_secs = format!("{:.2}", audio_secs).as_str(),
                    elapsed_ms,
                    chars = text.len(),
                    "Transcription completed"
                );
                Ok(text)
            }
            Err(e) => {
                {
                    let mut stats = self.stats.write().await;
                    stats.total_requests += 1;
                    stats.failed_requests += 1;
                }
                Err(AppError::Inference(e.to_string()))
            }
        }
    }

    /// Hub repository of the loaded checkpoint.
    pub fn model_repo(&self) -> &str {
        &self.repo
    }

    /// Snapshot of the engine counters.
    pub async fn stats(&self) -> EngineStats {
        self.stats.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_confidence_value() {
        assert_eq!(FIXED_CONFIDENCE, 0.9);
    }

    #[test]
    fn test_average_processing_ms() {
        let stats = EngineStats {
            total_requests: 5,
            failed_requests: 1,
            total_processing_ms: 800,
        };
        assert_eq!(stats.average_processing_ms(), 200);

        let empty = EngineStats::default();
        assert_eq!(empty.average_processing_ms(), 0);
    }
}
