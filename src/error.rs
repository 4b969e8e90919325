//! Error types for the feedback dashboard client
//!
//! This module provides structured error definitions using thiserror and a
//! coarse [`ErrorKind`] classification that callers use to decide how a
//! failure is surfaced (inline message, degraded panel, alert or logout).

use thiserror::Error;

/// Main error type for dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Client-side input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend answered with a non-success status
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Transport or response decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing, rejected or expired session
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Single-flight action re-invoked while a request is outstanding
    #[error("Already in progress: {0}")]
    InFlight(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// How an error should be treated by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Surface locally and immediately, nothing was sent
    Validation,
    /// Backend or transport failure, recoverable by retry
    Service,
    /// Session must be torn down and the user sent to login
    Auth,
    /// Action ignored because an identical one is still running
    Busy,
    /// Local environment problem (config, disk, encoding)
    Internal,
}

impl DashboardError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Service { .. } | Self::Http(_) => ErrorKind::Service,
            Self::Auth(_) => ErrorKind::Auth,
            Self::InFlight(_) => ErrorKind::Busy,
            Self::Config(_) | Self::Io(_) | Self::Serialization(_) | Self::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// True when the session guard must force a logout
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Convert anyhow::Error to DashboardError
impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Other(err.to_string())
    }
}
