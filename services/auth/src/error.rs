//! Error types for the session layer

use common::error::{StorageError, TransportError};
use thiserror::Error;

/// The credential is not a claims-bearing token
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Token structure, encoding or payload shape is invalid
    #[error("Malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    /// A refresh token was presented where an access token is required
    #[error("Expected an access token, got a {0} token")]
    WrongTokenType(&'static str),
}

/// Login failed; nothing was stored
#[derive(Error, Debug)]
pub enum AuthenticationError {
    /// The server refused the username/password pair
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The server returned an access token that does not decode
    #[error("Server returned an unusable token: {0}")]
    InvalidToken(#[from] DecodeError),

    /// The server returned an access token that is already expired
    #[error("Server returned an expired token")]
    Expired,

    /// The login request did not complete
    #[error("Login request failed: {0}")]
    Transport(#[source] TransportError),

    /// The tokens could not be persisted
    #[error("Failed to persist credentials: {0}")]
    Storage(#[from] StorageError),
}

impl From<TransportError> for AuthenticationError {
    fn from(error: TransportError) -> Self {
        if error.is_rejection() {
            AuthenticationError::InvalidCredentials
        } else {
            AuthenticationError::Transport(error)
        }
    }
}

/// Registration failed; no session was touched
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Input rejected before any request was made
    #[error("Invalid registration: {0}")]
    Invalid(String),

    /// The server refused the registration
    #[error("Registration rejected: {0}")]
    Rejected(String),

    /// The registration request did not complete
    #[error("Registration request failed: {0}")]
    Transport(#[source] TransportError),
}

impl From<TransportError> for RegistrationError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Rejected { status, message } if status < 500 => {
                RegistrationError::Rejected(message)
            }
            TransportError::Unauthorized => {
                RegistrationError::Rejected("Unauthorized".to_string())
            }
            other => RegistrationError::Transport(other),
        }
    }
}
