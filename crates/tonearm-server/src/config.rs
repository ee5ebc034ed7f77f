//! Application configuration management.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Global configuration instance.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Path to the library directory holding the audio files.
    pub music_folder: PathBuf,
    /// Path to the built web client, served at `/` when present.
    pub web_dist: PathBuf,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json or pretty).
    pub log_format: LogFormat,
    /// Allowed CORS origins (comma-separated, or * for all).
    pub cors_origins: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable colored output.
    Pretty,
    /// JSON structured logging for production.
    Json,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if required configuration is missing or invalid.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid u16");

        let music_folder = PathBuf::from(
            std::env::var("MUSIC_FOLDER").unwrap_or_else(|_| "./music".to_string()),
        );

        let web_dist = PathBuf::from(
            std::env::var("WEB_DIST").unwrap_or_else(|_| "./crates/tonearm-web/dist".to_string()),
        );

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match std::env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port,
            music_folder,
            web_dist,
            log_level,
            log_format,
            cors_origins,
        }
    }

    /// Validate the configuration.
    ///
    /// Creates the library directory on first start if it does not exist.
    ///
    /// # Errors
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.music_folder.exists() {
            std::fs::create_dir_all(&self.music_folder).map_err(|e| {
                ConfigError::MusicFolderCreationFailed(
                    self.music_folder.display().to_string(),
                    e,
                )
            })?;
            tracing::info!(path = %self.music_folder.display(), "Created library directory");
        }

        if !self.music_folder.is_dir() {
            return Err(ConfigError::MusicFolderNotDirectory(
                self.music_folder.display().to_string(),
            ));
        }

        if !self.web_dist.is_dir() {
            tracing::warn!(
                path = %self.web_dist.display(),
                "Web client dist directory not found, serving API only"
            );
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to create library directory '{0}': {1}")]
    MusicFolderCreationFailed(String, std::io::Error),

    #[error("Library path is not a directory: {0}")]
    MusicFolderNotDirectory(String),
}

/// Initialize the global configuration.
///
/// Should be called once at application startup.
pub fn init() -> &'static Config {
    CONFIG.get_or_init(|| {
        dotenvy::dotenv().ok();
        Config::from_env()
    })
}
