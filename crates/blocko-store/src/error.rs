//! Error types for the store module.

use thiserror::Error;

/// Errors from decoding a container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The container id in the header is not ours.
    #[error("bad magic: expected container id {expected}, found {found}")]
    BadMagic { expected: u64, found: u64 },

    /// The container was written by a newer format.
    #[error("unsupported container version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u64, supported: u64 },

    /// Input ended before a field was complete.
    #[error("truncated at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: u64,
        remaining: usize,
    },

    /// The chain name is not valid UTF-8.
    #[error("chain name is not valid UTF-8")]
    InvalidName,
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Ids must strictly increase in commit order.
    #[error("block id {got} is not greater than the last committed id {last}")]
    NonMonotonicId { last: u32, got: u32 },

    /// A minted block must carry the store's next id.
    #[error("block id {got} is not the next id {expected}")]
    NotNextId { expected: u32, got: u32 },

    /// The u32 id space is used up.
    #[error("block id space exhausted")]
    IdSpaceExhausted,

    /// Container decoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
