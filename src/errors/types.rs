//! Error type definitions for the IPTV checker

use std::time::Duration;

use thiserror::Error;

/// Top-level application error type
///
/// Everything in here is fatal for a run: a missing external tool, a bad
/// configuration value or an unreadable catalog stops processing before any
/// partial result is written.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A required external tool is missing or not runnable
    #[error("Required tool unavailable: {tool} - {message}")]
    ToolUnavailable { tool: String, message: String },

    /// Catalog structure or I/O errors
    #[error("Catalog error: {path} - {message}")]
    Catalog { path: String, message: String },

    /// File system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while invoking an external capability (inspector, player)
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// The hard wall-clock timeout elapsed; the process has been killed
    #[error("{tool} timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    /// The process could not be started
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while talking to a running process
    #[error("I/O error while running {tool}: {message}")]
    Io { tool: String, message: String },

    /// The tool produced output we could not interpret
    #[error("Malformed output from {tool}: {message}")]
    MalformedOutput { tool: String, message: String },
}

/// Transport-level failures seen by the reachability client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReachabilityError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects: {0}")]
    TooManyRedirects(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl ReachabilityError {
    /// Whether the failure is worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ConnectionReset(_))
    }
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a tool-unavailable error
    pub fn tool_unavailable<T: Into<String>, M: Into<String>>(tool: T, message: M) -> Self {
        Self::ToolUnavailable {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a catalog error
    pub fn catalog<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Catalog {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl CapabilityError {
    /// Classify a failure to run a tool's process to completion
    ///
    /// A missing or non-executable binary is a spawn failure; anything else
    /// went wrong while talking to the running process.
    pub fn from_process_error<T: Into<String>>(tool: T, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Self::Spawn {
                tool: tool.into(),
                source: error,
            },
            _ => Self::Io {
                tool: tool.into(),
                message: error.to_string(),
            },
        }
    }

    /// Whether the failure came from the caller-enforced timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
