//! # Configuration Management
//!
//! Loads application configuration from multiple sources:
//! - TOML configuration file (config.toml)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_SERVER_HOST, APP_SERVER_PORT, ...)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! A deployment that never ships a config.toml binds all interfaces on port
//! 5000, loads the Akan Whisper checkpoint, and enforces the 15 second clip
//! limit.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub limits: LimitsConfig,
}

/// Server bind settings.
///
/// `host = "0.0.0.0"` accepts connections from any interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Pretrained model settings.
///
/// `repo` is a Hugging Face hub repository id. The checkpoint must be a
/// Whisper-family model: the loader expects `config.json`, `tokenizer.json`,
/// and `model.safetensors` in the repo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub repo: String,
    pub revision: String,
}

/// Request admission limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum clip duration in seconds; longer uploads are rejected with a
    /// client error before inference.
    pub max_clip_secs: u64,

    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            model: ModelConfig {
                repo: "dennis-9/whisper-small_Akan_non_standardspeech".to_string(),
                revision: "main".to_string(),
            },
            limits: LimitsConfig {
                max_clip_secs: 15,
                max_upload_bytes: 10 * 1024 * 1024, // 10 MB covers 15s in any common codec
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, config.toml, and the environment.
    ///
    /// `HOST` and `PORT` are honored without the APP_ prefix because
    /// deployment platforms commonly inject them.
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("_"));

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// Catching bad values here keeps startup failures readable instead of
    /// surfacing later as a bind error or a rejected request.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.model.repo.trim().is_empty() {
            return Err(anyhow::anyhow!("Model repository cannot be empty"));
        }

        if self.limits.max_clip_secs == 0 {
            return Err(anyhow::anyhow!("Maximum clip duration must be greater than 0"));
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("Maximum upload size must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.limits.max_clip_secs, 15);
        assert_eq!(
            config.model.repo,
            "dennis-9/whisper-small_Akan_non_standardspeech"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.limits.max_clip_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.model.repo = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
