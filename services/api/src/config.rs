//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub gemini_api_key: String,
    pub inference_base_url: String,
    pub inference_model: String,
    pub inference_timeout: Duration,
    pub openai_api_key: Option<String>,
    pub sst_model: String,
    pub data_path: Option<PathBuf>,
    pub seed_sample_routine: bool,
}

fn invalid(var: &str, detail: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue(var.to_string(), detail.into())
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDRESS", e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            invalid(
                "RUST_LOG",
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        // --- Inference Service ---
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;
        let inference_base_url = std::env::var("INFERENCE_BASE_URL").unwrap_or_else(|_| {
            "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
        });
        let inference_model = std::env::var("INFERENCE_MODEL")
            .unwrap_or_else(|_| "gemini-2.5-flash-lite".to_string());

        let timeout_str =
            std::env::var("INFERENCE_TIMEOUT_SECS").unwrap_or_else(|_| "15".to_string());
        let inference_timeout = match timeout_str.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                return Err(invalid(
                    "INFERENCE_TIMEOUT_SECS",
                    format!("'{}' is not a positive number of seconds", timeout_str),
                ))
            }
        };

        // --- Speech-to-Text (optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let sst_model = std::env::var("SST_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        // --- Storage ---
        let data_path = std::env::var("DATA_PATH").ok().map(PathBuf::from);
        let seed_str =
            std::env::var("SEED_SAMPLE_ROUTINE").unwrap_or_else(|_| "false".to_string());
        let seed_sample_routine = seed_str
            .parse::<bool>()
            .map_err(|_| invalid("SEED_SAMPLE_ROUTINE", format!("'{}' is not a bool", seed_str)))?;

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            gemini_api_key,
            inference_base_url,
            inference_model,
            inference_timeout,
            openai_api_key,
            sst_model,
            data_path,
            seed_sample_routine,
        })
    }
}
