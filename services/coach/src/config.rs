//! Application Configuration Module
//!
//! Centralizes the configuration for the coach service. Settings are loaded
//! from environment variables into a single struct that is passed throughout
//! the application.

use std::env;
use std::time::Duration;
use tracing::Level;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub chat_model: String,
    pub base_url: String,
    pub report_timeout: Duration,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Invalid value for REPORT_TIMEOUT_SECS: {0}")]
    InvalidTimeout(String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `GEMINI_API_KEY`: Your secret key for the Gemini API. Required.
    // *   `CHAT_MODEL`: (Optional) The model used for report generation. Defaults to "gemini-2.5-flash".
    // *   `GEMINI_BASE_URL`: (Optional) Endpoint base, overridable for testing/proxying.
    // *   `REPORT_TIMEOUT_SECS`: (Optional) How long a report request may run before it
    //     resolves as a failed (absent) report. Defaults to 60.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Useful for local development, ignored if not present.
        dotenvy::dotenv().ok();

        let gemini_api_key = env::var("GEMINI_API_KEY").map_err(|_| {
            ConfigError::MissingVar("GEMINI_API_KEY must be set".to_string())
        })?;

        let chat_model =
            env::var("CHAT_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        let base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| coach_core::client::DEFAULT_BASE_URL.to_string());

        let timeout_str = env::var("REPORT_TIMEOUT_SECS").unwrap_or_else(|_| "60".to_string());
        let report_timeout = timeout_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidTimeout(timeout_str))?;

        let log_level_str = env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        Ok(Self {
            gemini_api_key,
            chat_model,
            base_url,
            report_timeout,
            log_level,
        })
    }
}
