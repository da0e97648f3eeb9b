//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::backend::BackendError;
use crate::monitor::MonitorError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Snapshot file unreadable or malformed
    SnapshotError,
    /// Monitor could not be started
    StartFailed,
    /// Monitor stopped on a backend failure
    BackendFailure,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "LOSTUSER_CLI_CONFIG_ERROR",
            Self::IoError => "LOSTUSER_CLI_IO_ERROR",
            Self::SnapshotError => "LOSTUSER_CLI_SNAPSHOT_ERROR",
            Self::StartFailed => "LOSTUSER_CLI_START_FAILED",
            Self::BackendFailure => "LOSTUSER_CLI_BACKEND_FAILURE",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn snapshot_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SnapshotError, msg)
    }

    pub fn start_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::StartFailed, msg)
    }

    pub fn backend_failure(error: &BackendError) -> Self {
        Self::new(
            CliErrorCode::BackendFailure,
            format!("monitor stopped: {}", error),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<MonitorError> for CliError {
    fn from(e: MonitorError) -> Self {
        match e {
            MonitorError::Config(msg) => Self::config_error(msg),
            other => Self::start_failed(other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
