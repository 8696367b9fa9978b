//! Error types for the storage adapters

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid store configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for bathroom_core::BathroomError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(io) => bathroom_core::BathroomError::Io(io),
            other => bathroom_core::BathroomError::Serialization(other.to_string()),
        }
    }
}
