//! # Backend Errors
//!
//! Error types for backend queries. The monitor distinguishes "not found"
//! from every other failure, so that variant is kept separate.

use thiserror::Error;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Backend errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The named resource does not exist (anymore)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The backend could not answer the query
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with data that could not be decoded
    #[error("Malformed backend data: {0}")]
    Decode(String),

    /// Local I/O failed while talking to the backend
    #[error("Backend I/O error: {0}")]
    Io(String),
}

impl BackendError {
    /// True if the error means the resource is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }

    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::NotFound(_) => "LOSTUSER_BACKEND_NOT_FOUND",
            BackendError::Unavailable(_) => "LOSTUSER_BACKEND_UNAVAILABLE",
            BackendError::Decode(_) => "LOSTUSER_BACKEND_DECODE",
            BackendError::Io(_) => "LOSTUSER_BACKEND_IO",
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_found_is_not_found() {
        assert!(BackendError::NotFound("pvc-1".into()).is_not_found());
        assert!(!BackendError::Unavailable("down".into()).is_not_found());
        assert!(!BackendError::Decode("bad".into()).is_not_found());
        assert!(!BackendError::Io("eof".into()).is_not_found());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = BackendError::NotFound("pvc-1".into());
        assert_eq!(err.to_string(), "Resource not found: pvc-1");
        assert_eq!(err.code(), "LOSTUSER_BACKEND_NOT_FOUND");
    }
}
