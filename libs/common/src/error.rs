//! Custom error types for the common library
//!
//! This module defines the error types shared by the session and media crates:
//! failures of the remote transports and of the local credential storage.

use thiserror::Error;

/// Failure of a request/response call to one of the remote collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server rejected the bearer credential (HTTP 401)
    #[error("Unauthorized")]
    Unauthorized,

    /// The server answered with a non-success status
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A request URL could not be built from the configured base address
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Whether the server refused the request itself (401 or another 4xx)
    ///
    /// A 5xx answer is a server failure, not a verdict on the request.
    pub fn is_rejection(&self) -> bool {
        match self {
            TransportError::Unauthorized => true,
            TransportError::Rejected { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}

/// Failure of the persistent credential storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not contain valid slot data
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Result with TransportError
pub type TransportResult<T> = Result<T, TransportError>;

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections() {
        assert!(TransportError::Unauthorized.is_rejection());
        assert!(
            TransportError::Rejected {
                status: 400,
                message: "bad".to_string()
            }
            .is_rejection()
        );
        assert!(!TransportError::Network("refused".to_string()).is_rejection());
        assert!(
            !TransportError::Rejected {
                status: 503,
                message: "Service Unavailable".to_string()
            }
            .is_rejection()
        );
    }
}
