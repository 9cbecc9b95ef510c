//! Error types for Shopfront

use thiserror::Error;

/// Result type alias using Shopfront Error
pub type Result<T> = std::result::Result<T, Error>;

/// Shopfront error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database connection is closed")]
    ConnectionClosed,

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Auth error: {0}")]
    Auth(String),
}
