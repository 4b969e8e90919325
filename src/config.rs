//! Layered configuration for the dashboard client
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. TOML file (`<config dir>/config.toml` or an explicit path)
//! 3. Environment variables prefixed with `FEEDBACK_` (e.g. `FEEDBACK_API_URL`)

use crate::error::{DashboardError, Result};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const ENV_PREFIX: &str = "FEEDBACK";

/// Effective client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Backend base URL
    pub api_url: String,

    /// Per-request timeout enforced by the transport
    pub request_timeout_secs: u64,

    /// Dashboard input poll interval in milliseconds
    pub refresh_ms: u64,

    /// Cached results kept per query
    pub cache_capacity: usize,

    /// Where exported reports are written
    pub download_dir: PathBuf,

    /// Where the session token is persisted
    pub session_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl DashboardConfig {
    /// Load configuration, reading `path` if given or the default file if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let project = project_dirs()?;
        let default_file = project.config_dir().join("config.toml");

        let file = match path {
            Some(p) => File::from(p).format(FileFormat::Toml).required(true),
            None => File::from(default_file.as_path())
                .format(FileFormat::Toml)
                .required(false),
        };

        let download_dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
        let session_file = project.config_dir().join("session.token");

        let settings = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("request_timeout_secs", 30)?
            .set_default("refresh_ms", 250)?
            .set_default("cache_capacity", 32)?
            .set_default("download_dir", path_string(&download_dir))?
            .set_default("session_file", path_string(&session_file))?
            .set_default("log_level", "info")?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        debug!("Loaded configuration for {}", config.api_url);
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(DashboardError::Config(config::ConfigError::Message(format!(
                "api_url must be an http(s) URL, got {:?}",
                self.api_url
            ))));
        }
        if self.cache_capacity == 0 {
            return Err(DashboardError::Config(config::ConfigError::Message(
                "cache_capacity must be at least 1".to_string(),
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    /// Render as TOML for display
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DashboardError::Other(e.to_string()))
    }
}

/// Platform data directory for logs
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "feedback", "feedback-dash").ok_or_else(|| {
        DashboardError::Config(config::ConfigError::Message(
            "Failed to determine config directory".to_string(),
        ))
    })
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
