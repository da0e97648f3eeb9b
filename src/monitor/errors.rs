//! Monitor start-up errors
//!
//! Once running, the monitor reports how it ended through
//! [`Termination`](super::Termination) rather than through an error.

use thiserror::Error;

use crate::backend::BackendError;

/// Result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// Invalid monitor configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The may-promote event stream could not be opened
    #[error("Failed to subscribe to promotion events: {0}")]
    Subscribe(#[source] BackendError),
}

impl MonitorError {
    pub fn config(message: impl Into<String>) -> Self {
        MonitorError::Config(message.into())
    }
}
