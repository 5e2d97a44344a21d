//! # Transcription Module
//!
//! Speech-to-text over the pretrained Akan Whisper checkpoint, via Candle-rs.
//! Pure Rust; no FFI bindings to whisper.cpp.
//!
//! ## Components:
//! - **model**: checkpoint loading, feature extraction, greedy decoding
//! - **engine**: process-wide model host, serialized inference access
//! - **corrector**: fixed lexical substitution pass over raw output

pub mod corrector;
pub mod engine;
pub mod model;

pub use engine::{TranscriptionEngine, FIXED_CONFIDENCE};
