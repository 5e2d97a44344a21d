//! # Transcription Endpoint
//!
//! `POST /transcribe`: multipart upload in, transcription out.
//!
//! ## Request:
//! Multipart form data with an audio file field named "audio".
//!
//! ## Response:
//! ```json
//! {
//!   "transcription": "Akan speech sample",
//!   "confidence": 0.9
//! }
//! ```
//!
//! The pipeline is strictly sequential within the request: collect upload →
//! normalize audio → infer → correct text. A missing field or an over-long
//! clip stops the pipeline before the model is touched.

use crate::audio;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::transcription::{corrector, FIXED_CONFIDENCE};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Serialize;

/// Success payload for `POST /transcribe`.
///
/// `confidence` is the fixed placeholder value, not a decoder probability.
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcription: String,
    pub confidence: f32,
}

/// Handle `POST /transcribe`.
pub async fn transcribe(
    state: web::Data<AppState>,
    payload: actix_multipart::Multipart,
) -> Result<HttpResponse, AppError> {
    let audio_bytes = collect_audio_field(payload, state.config.limits.max_upload_bytes).await?;

    let samples = audio::normalize_upload(&audio_bytes, state.config.limits.max_clip_secs)?;

    let raw_text = state.engine.transcribe(&samples).await?;
    let corrected = corrector::correct(&raw_text);

    Ok(HttpResponse::Ok().json(TranscribeResponse {
        transcription: corrected,
        confidence: FIXED_CONFIDENCE,
    }))
}

/// Pull the bytes of the `audio` field out of the multipart stream.
///
/// Fields with any other name are drained and ignored. A form without an
/// `audio` field is a client error.
async fn collect_audio_field(
    mut payload: actix_multipart::Multipart,
    max_upload_bytes: usize,
) -> AppResult<Vec<u8>> {
    let mut audio_bytes: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Internal(format!("multipart error: {}", e)))?;

        let is_audio = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(|name| name == "audio")
            .unwrap_or(false);

        if !is_audio {
            // drain so the stream can progress to the next field
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::Internal(format!("multipart error: {}", e)))?;
            }
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::Internal(format!("multipart error: {}", e)))?;
            if bytes.len() + chunk.len() > max_upload_bytes {
                return Err(AppError::UploadTooLarge {
                    limit_bytes: max_upload_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        audio_bytes = Some(bytes);
    }

    audio_bytes.ok_or(AppError::MissingAudio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serialization() {
        let response = TranscribeResponse {
            transcription: "Akan speech".to_string(),
            confidence: FIXED_CONFIDENCE,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["transcription"], "Akan speech");
        assert!((json["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }
}
