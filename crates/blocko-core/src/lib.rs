//! # BlockO Core
//!
//! Pure primitives for BlockO: blocks, canonical hashing, the crypto provider
//! boundary and authority validation.
//!
//! This crate contains no I/O and no storage. It is pure computation over
//! signed, hash-linked blocks.
//!
//! ## Key Types
//!
//! - [`Block`] - One signed, hash-linked record
//! - [`CryptoProvider`] - The capability set consumed from a crypto backend
//! - [`Ed25519Provider`] - Ed25519 signatures over Blake3 digests
//! - [`Signer`] - The active signing identity for one operation
//! - [`BlockLookup`] - Access to already-accepted blocks during validation
//!
//! ## Authority
//!
//! Each block names an `owner` key. The *next* block must be signed by that
//! key. Genesis signs itself and binds the chain name into its `prev_hash`.
//! See [`validate_block`].

pub mod block;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod validation;

pub use block::{Block, BlockBuilder, BlockSignature, GENESIS_ID};
pub use canonical::{
    canonical_bytes, canonical_hash, canonical_signature_bytes, canonical_signature_hash,
};
pub use crypto::{CryptoProvider, Ed25519Provider, KeyKind, KeyPair, Signer};
pub use error::{CryptoError, ValidationError};
pub use validation::{validate_block, BlockLookup};
