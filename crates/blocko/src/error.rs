//! Error types for chain operations.

use blocko_core::{CryptoError, ValidationError};
use blocko_store::{CodecError, StoreError};
use thiserror::Error;

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The block to extend does not itself validate.
    #[error("invalid stem block: {0}")]
    InvalidStem(ValidationError),

    /// Signing the candidate block failed or its self-check did not pass.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The signed candidate does not validate, usually because the active
    /// key is not the owner the stem names.
    #[error("authorization mismatch: {0}")]
    AuthorizationMismatch(ValidationError),

    /// Key or provider error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Container header error.
    #[error("container error: {0}")]
    Codec(#[from] CodecError),

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No block with this id.
    #[error("block not found: {0}")]
    BlockNotFound(u32),
}

/// Result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
