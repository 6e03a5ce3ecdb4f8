//! Domain-specific error types for the Stampede load generator
//!
//! Two layers live here:
//! - [`StressError`] for failures that stop the tool before or around a run
//!   (bad configuration, HTTP client construction, misuse of the orchestrator)
//! - [`RequestFailure`] for the outcome of a single request attempt, which is
//!   recorded and never propagated

use std::time::Duration;
use thiserror::Error;

/// Main error type for the Stampede application
#[derive(Error, Debug)]
pub enum StressError {
    /// Configuration-related errors (CLI parsing, validation, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network transport errors raised outside of a request attempt
    #[error("Transport error: {0}")]
    Transport(String),

    /// Run execution errors (orchestrator misuse, task failures, etc.)
    #[error("Run execution error: {0}")]
    Execution(String),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

/// Result type using StressError
pub type Result<T> = std::result::Result<T, StressError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    fn with_config_context(self, msg: &str) -> Result<T>;
    fn with_transport_context(self, msg: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_config_context(self, msg: &str) -> Result<T> {
        self.map_err(|e| StressError::Config(format!("{}: {}", msg, e)))
    }

    fn with_transport_context(self, msg: &str) -> Result<T> {
        self.map_err(|e| StressError::Transport(format!("{}: {}", msg, e)))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn with_config_context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| StressError::Config(msg.to_string()))
    }

    fn with_transport_context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| StressError::Transport(msg.to_string()))
    }
}

// Convenience constructors
impl StressError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        StressError::Config(msg.into())
    }

    pub fn execution<S: Into<String>>(msg: S) -> Self {
        StressError::Execution(msg.into())
    }
}

/// Why a single request attempt did not succeed.
///
/// The `Display` output is the error label stored on the recorded outcome and
/// counted in the summary's error histogram.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// Connection, DNS or other network-level failure
    #[error("{0}")]
    Transport(String),

    /// No response within the configured per-request timeout
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Exchange completed with a non-success status
    #[error("HTTP {0}")]
    Protocol(u16),

    /// Aborted because the run was cancelled
    #[error("Request cancelled")]
    Cancelled,
}

impl RequestFailure {
    /// Status code of the completed exchange, if there was one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestFailure::Protocol(status) => Some(*status),
            _ => None,
        }
    }
}
