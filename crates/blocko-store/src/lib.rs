//! # BlockO Store
//!
//! Storage for BlockO chains: an in-memory append-only [`ChainStore`] and the
//! versioned binary container used to persist a whole chain.
//!
//! ## Key Types
//!
//! - [`ChainStore`] - Ordered blocks, id index, chain name and next-id counter
//! - [`ContainerDecoder`] - Streaming reader over a container buffer
//! - [`encode_container`] - Serialize a chain into one buffer
//! - [`Field`] - Fixed binary encoding shared by every container field
//!
//! ## Usage
//!
//! ```rust
//! use blocko_core::Block;
//! use blocko_store::{encode_container, ContainerDecoder};
//!
//! let blocks = vec![Block::default()];
//! let bytes = encode_container("Acme", &blocks);
//!
//! let decoder = ContainerDecoder::open(&bytes).unwrap();
//! assert_eq!(decoder.name(), "Acme");
//! assert_eq!(decoder.count(), 1);
//! ```
//!
//! ## Design Notes
//!
//! - **No validation here**: the store trusts its caller to validate first
//! - **Monotonic ids**: the store refuses an id not above the current head
//! - **Record-level errors**: a bad record stops decoding but keeps what came before

pub mod chain;
pub mod codec;
pub mod container;
pub mod error;

pub use chain::ChainStore;
pub use codec::{Field, Reader, Writer};
pub use container::{
    encode_container, ContainerDecoder, ContainerHeader, CONTAINER_ID, FORMAT_VERSION,
};
pub use error::{CodecError, Result, StoreError};
