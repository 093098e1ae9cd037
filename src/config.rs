//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (None selects the in-memory backend)
    pub backend_url: Option<String>,
    /// Public (anon) API key sent with every backend request
    pub backend_anon_key: String,
    /// Directory holding the persisted session slot
    pub session_dir: PathBuf,
    /// Per-request HTTP timeout
    pub fetch_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_anon_key: "test_anon_key".to_string(),
            session_dir: PathBuf::from(".gym-tracker"),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend_url = env::var("GYM_BACKEND_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        // The anon key is only needed when talking to a real backend.
        let backend_anon_key = match (&backend_url, env::var("GYM_BACKEND_ANON_KEY")) {
            (_, Ok(key)) => key.trim().to_string(),
            (Some(_), Err(_)) => return Err(ConfigError::Missing("GYM_BACKEND_ANON_KEY")),
            (None, Err(_)) => String::new(),
        };

        let fetch_timeout_secs = match env::var("GYM_FETCH_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("GYM_FETCH_TIMEOUT_SECS", v))?,
            Err(_) => 10,
        };

        Ok(Self {
            backend_url,
            backend_anon_key,
            session_dir: env::var("GYM_SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".gym-tracker")),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        })
    }

    /// True when no backend URL is configured.
    pub fn is_offline(&self) -> bool {
        self.backend_url.is_none()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
