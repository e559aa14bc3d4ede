//! Error types for BlockO core.

use thiserror::Error;

use crate::crypto::KeyKind;

/// Errors from the crypto provider and the active signer.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("wrong key type: expected a {expected} key, but only a {found} key is loaded")]
    WrongKeyType { expected: KeyKind, found: KeyKind },

    #[error("no key loaded")]
    NoKey,

    #[error("invalid {kind} key: {reason}")]
    InvalidKey { kind: KeyKind, reason: String },

    #[error("malformed signature")]
    MalformedSignature,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("random source failure: {0}")]
    Random(String),
}

/// Why a block failed authority validation.
///
/// Checks run in declaration order and stop at the first failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("genesis block prev_hash does not match the chain name digest")]
    GenesisMismatch,

    #[error("block {id}: predecessor {prev_id} not found")]
    PredecessorMissing { id: u32, prev_id: u32 },

    #[error("block {id}: prev_hash does not match predecessor {prev_id}")]
    ChainBroken { id: u32, prev_id: u32 },

    #[error("block {id}: signature hash does not match block contents")]
    HashMismatch { id: u32 },

    #[error("block {id}: signature invalid for predecessor owner key")]
    SignatureInvalid { id: u32 },
}

impl ValidationError {
    /// Short stable name of the failure, for logs and reports.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::GenesisMismatch => "genesis_mismatch",
            ValidationError::PredecessorMissing { .. } => "predecessor_missing",
            ValidationError::ChainBroken { .. } => "chain_broken",
            ValidationError::HashMismatch { .. } => "hash_mismatch",
            ValidationError::SignatureInvalid { .. } => "signature_invalid",
        }
    }
}
