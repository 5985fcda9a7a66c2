//! Error types for the media crate

use common::error::TransportError;
use thiserror::Error;

/// Opening a live update subscription failed
#[derive(Error, Debug)]
pub enum LiveUpdateError {
    /// The configured base address cannot be turned into a websocket URL
    #[error("Invalid live update address: {0}")]
    InvalidUrl(String),

    /// The websocket handshake did not complete
    #[error("Live update connection failed: {0}")]
    Connect(String),
}

/// A text frame that is not valid Engine.IO / Socket.IO framing
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown packet type: {0}")]
    UnknownType(char),

    #[error("Invalid packet payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Event packet without an event name")]
    MissingEventName,
}

/// Opening a synchronized view failed
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Live(#[from] LiveUpdateError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
