use clap::Parser;
use reqwest::Url;
use tracing::Level;

pub const DEFAULT_AGENT_NAME: &str = "Mozart";
pub const DEFAULT_LIVEKIT_URL: &str = "wss://livekit.rtc.elevenlabs.io";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Command-line overrides for the environment.
#[derive(Parser, Debug, Default, Clone)]
#[command(version, about = "Talk to a conversational agent over WebRTC")]
pub struct Args {
    /// Base URL of the token backend (overrides BACKEND_URL).
    #[arg(long)]
    pub backend_url: Option<String>,
    /// Agent to talk to (overrides AGENT_ID).
    #[arg(long)]
    pub agent_id: Option<String>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub agent_id: String,
    pub agent_name: String,
    pub livekit_url: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&Args::default())
    }

    /// Loads configuration from environment variables, letting `args` win.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let backend_url = required("BACKEND_URL", args.backend_url.clone())?;
        let parsed = Url::parse(&backend_url)
            .map_err(|e| ConfigError::InvalidValue("BACKEND_URL".to_string(), e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue(
                "BACKEND_URL".to_string(),
                format!("'{}' is not a base URL", backend_url),
            ));
        }
        let backend_url = backend_url.trim_end_matches('/').to_string();

        let agent_id = required("AGENT_ID", args.agent_id.clone())?;

        let agent_name = std::env::var("AGENT_NAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string());

        let livekit_url =
            std::env::var("LIVEKIT_URL").unwrap_or_else(|_| DEFAULT_LIVEKIT_URL.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            backend_url,
            agent_id,
            agent_name,
            livekit_url,
            log_level,
        })
    }
}

/// Takes the override if given, otherwise the variable. Blank counts as missing.
fn required(name: &str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .or_else(|| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}
