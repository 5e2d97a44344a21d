//! # Error Handling
//!
//! Custom error types and their conversion to HTTP responses.
//!
//! Every failure stage of the transcription pipeline gets its own variant
//! (multipart intake, audio decode, resample, inference) so each failure mode
//! maps to a distinct, documented error kind instead of an opaque stringified
//! exception.
//!
//! ## HTTP mapping:
//! - Client input problems (missing file, clip too long) → 400
//! - Processing problems (decode, resample, inference) → 500
//!
//! All error responses use the same flat JSON shape:
//! ```json
//! {"error": "Audio is too long (>15s)"}
//! ```

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Errors that can surface from a transcription request.
#[derive(Debug)]
pub enum AppError {
    /// The multipart form did not contain an `audio` field.
    MissingAudio,

    /// The uploaded clip exceeds the configured duration limit (seconds).
    AudioTooLong { limit_secs: u64 },

    /// The upload body exceeds the configured size limit (bytes).
    UploadTooLarge { limit_bytes: usize },

    /// The uploaded bytes could not be decoded as audio.
    Decode(String),

    /// Sample-rate conversion to 16 kHz failed.
    Resample(String),

    /// Model inference or token decoding failed.
    Inference(String),

    /// Anything else that went wrong server-side.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingAudio => write!(f, "No audio file provided"),
            AppError::AudioTooLong { limit_secs } => {
                write!(f, "Audio is too long (>{}s)", limit_secs)
            }
            AppError::UploadTooLarge { limit_bytes } => {
                write!(f, "Upload is too large (>{} bytes)", limit_bytes)
            }
            AppError::Decode(msg) => write!(f, "Audio decode failed: {}", msg),
            AppError::Resample(msg) => write!(f, "Resampling failed: {}", msg),
            AppError::Inference(msg) => write!(f, "Transcription failed: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::MissingAudio
            | AppError::AudioTooLong { .. }
            | AppError::UploadTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::Decode(_)
            | AppError::Resample(_)
            | AppError::Inference(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Every error is logged server-side before the response is written.
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), "{}", self);
        } else {
            tracing::warn!(status = %status.as_u16(), "{}", self);
        }

        HttpResponse::build(status).json(json!({
            "error": self.to_string()
        }))
    }
}

/// Infrastructure errors become opaque 500s at the request boundary.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Shorthand for handler and pipeline return types.
pub type AppResult<T> = Result<T, AppError>;
