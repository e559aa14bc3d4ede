//! # BlockO Testkit
//!
//! Testing utilities for BlockO.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known canonical pre-images for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Seeded signers that build valid chains without a `Chain`
//!
//! ## Golden Vectors
//!
//! ```rust
//! use blocko_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! assert!(!all_vectors().is_empty());
//! verify_all_vectors().unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use blocko_testkit::generators::{BlockParams, block_from_params};
//!
//! proptest! {
//!     #[test]
//!     fn signature_hash_is_deterministic(params: BlockParams) {
//!         let b1 = block_from_params(&params);
//!         let b2 = block_from_params(&params);
//!         prop_assert_eq!(b1.signature.hash, b2.signature.hash);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use blocko_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seed([7; 32]);
//! let blocks = fixture.signed_chain("Acme", &[b"one", b"two"]);
//! assert_eq!(blocks.len(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
pub use generators::{block_from_params, BlockParams, Tamper};
pub use vectors::{all_vectors, verify_all_vectors, CanonicalVector};
