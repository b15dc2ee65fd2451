//! Error types for agora-core.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid amount (overflow, negative, or malformed).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid address format.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid key material.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}
