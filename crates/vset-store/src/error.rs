//! Error types for vector-set storage

use thiserror::Error;

/// Vector storage error type
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Batch insert returned no identifiers")]
    EmptyBatch,

    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    #[cfg(feature = "redis")]
    Redis(#[from] redis::RedisError),
}

impl VectorError {
    /// Backend failure reported by `backend`
    pub fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: message.into(),
        }
    }

    /// Rejected caller input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Result type for vector operations
pub type VectorResult<T> = Result<T, VectorError>;
