//! Error types for Bathroom Now

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BathroomError {
    // Model errors
    #[error("Invalid coordinates ({latitude}, {longitude}): {reason}")]
    InvalidCoordinates {
        latitude: f64,
        longitude: f64,
        reason: String,
    },

    #[error("Invalid view window: {reason}")]
    InvalidWindow { reason: String },

    #[error("Invalid status '{value}': expected open, closed or unknown")]
    InvalidStatus { value: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, BathroomError>;

/// Why a `lastConfirmed` value could not be turned into an instant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("timestamp is missing")]
    Missing,

    #[error("invalid ISO-8601 timestamp '{0}'")]
    InvalidIso(String),

    #[error("timestamp out of range")]
    OutOfRange,

    #[error("unsupported timestamp encoding")]
    UnsupportedShape,
}

/// Failure of a single-shot write against the remote document store
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote store unreachable: {0}")]
    Transport(String),

    #[error("Remote store rejected the write ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed remote response: {0}")]
    MalformedResponse(String),

    #[error("Remote store returned reserved identifier '{0}'")]
    ReservedId(String),

    #[error("Remote store not configured: {0}")]
    NotConfigured(String),
}
