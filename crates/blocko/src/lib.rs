//! # BlockO
//!
//! A signed, hash-linked, append-only chain of blocks where each block names
//! the key allowed to author the next one.
//!
//! ## Overview
//!
//! - **Blocks**: Immutable records linked by the canonical hash of their predecessor
//! - **Authority**: The predecessor's `owner` key must sign its successor
//! - **Genesis**: Self-signed, bound to the chain name
//! - **Persistence**: A versioned binary container, validated block by block on import
//!
//! ## Usage
//!
//! ```rust
//! use blocko::{Chain, ChainConfig};
//!
//! let mut chain = Chain::new(ChainConfig::default());
//! chain.new_chain("Acme").unwrap();
//!
//! let genesis = chain.find_block(0).cloned().unwrap();
//! let block = chain.create_block(&genesis, None, b"hello").unwrap();
//! assert_eq!(block.id, 1);
//!
//! let bytes = chain.export_bytes();
//! let mut copy = Chain::default();
//! let report = copy.import_bytes(&bytes).unwrap();
//! assert_eq!(report.accepted, 2);
//! ```
//!
//! ## Re-exports
//!
//! - `blocko::core` - Blocks, canonical hashing, crypto provider, validation
//! - `blocko::store` - Chain store and container codec

pub mod chain;
pub mod config;
pub mod error;

// Re-export component crates
pub use blocko_core as core;
pub use blocko_store as store;

// Re-export main types for convenience
pub use chain::{Chain, ImportReport, SkipReason, SkippedBlock};
pub use config::ChainConfig;
pub use error::{ChainError, Result};

// Re-export commonly used core types
pub use blocko_core::{
    Block, BlockSignature, CryptoProvider, Ed25519Provider, KeyKind, KeyPair, ValidationError,
};
