//! Canonical byte encoding of a block for hashing.
//!
//! The pre-image is a plain concatenation in fixed field order:
//!
//! ```text
//! id (u32 LE) || prev_id (u32 LE) || timestamp (u64 LE)
//!   || prev_hash || owner || nonce || data || signature.hash || signature.signature
//! ```
//!
//! Byte strings are appended raw, with no delimiters. Integers are
//! little-endian on every platform, so the same block hashes identically
//! everywhere.
//!
//! **This layout is frozen.** Changing it invalidates every existing chain.

use bytes::Bytes;

use crate::block::Block;
use crate::crypto::CryptoProvider;

/// Width of the fixed integer prefix (id, prev_id, timestamp).
pub const FIXED_PREFIX_LEN: usize = 4 + 4 + 8;

/// Encode a block's full pre-image, signature fields included.
pub fn canonical_bytes(block: &Block) -> Vec<u8> {
    let mut buf = signature_preimage_with_capacity(block, block_signature_len(block));
    buf.extend_from_slice(&block.signature.hash);
    buf.extend_from_slice(&block.signature.signature);
    buf
}

/// Encode a block's pre-image as if both signature fields were empty.
pub fn canonical_signature_bytes(block: &Block) -> Vec<u8> {
    signature_preimage_with_capacity(block, 0)
}

/// Digest of the full pre-image. This is what a successor stores as
/// `prev_hash`.
pub fn canonical_hash<P: CryptoProvider + ?Sized>(provider: &P, block: &Block) -> Bytes {
    provider.hash(&canonical_bytes(block))
}

/// Digest of the pre-image with signature fields cleared. This is what gets
/// signed.
pub fn canonical_signature_hash<P: CryptoProvider + ?Sized>(provider: &P, block: &Block) -> Bytes {
    provider.hash(&canonical_signature_bytes(block))
}

fn block_signature_len(block: &Block) -> usize {
    block.signature.hash.len() + block.signature.signature.len()
}

fn signature_preimage_with_capacity(block: &Block, extra: usize) -> Vec<u8> {
    let capacity = FIXED_PREFIX_LEN
        + block.prev_hash.len()
        + block.owner.len()
        + block.nonce.len()
        + block.data.len()
        + extra;

    let mut buf = Vec::with_capacity(capacity);
    buf.extend_from_slice(&block.id.to_le_bytes());
    buf.extend_from_slice(&block.prev_id.to_le_bytes());
    buf.extend_from_slice(&block.timestamp.to_le_bytes());
    buf.extend_from_slice(&block.prev_hash);
    buf.extend_from_slice(&block.owner);
    buf.extend_from_slice(&block.nonce);
    buf.extend_from_slice(&block.data);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockBuilder, BlockSignature};
    use crate::crypto::Ed25519Provider;

    fn sample_block() -> Block {
        Block {
            id: 1,
            prev_id: 0,
            timestamp: 0x10,
            nonce: Bytes::from_static(&[0xcc]),
            prev_hash: Bytes::from_static(&[0xaa]),
            owner: Bytes::from_static(&[0xbb]),
            data: Bytes::from_static(b"hi"),
            signature: BlockSignature {
                hash: Bytes::from_static(&[0xdd]),
                signature: Bytes::from_static(&[0xee]),
            },
        }
    }

    #[test]
    fn test_field_order() {
        let bytes = canonical_bytes(&sample_block());
        assert_eq!(
            hex::encode(bytes),
            concat!(
                "01000000",         // id
                "00000000",         // prev_id
                "1000000000000000", // timestamp
                "aa",               // prev_hash
                "bb",               // owner
                "cc",               // nonce
                "6869",             // data
                "dd",               // signature.hash
                "ee",               // signature.signature
            )
        );
    }

    #[test]
    fn test_signature_bytes_skip_signature_fields() {
        let block = sample_block();
        let full = canonical_bytes(&block);
        let unsigned = canonical_signature_bytes(&block);

        assert_eq!(unsigned.len(), full.len() - 2);
        assert_eq!(&full[..unsigned.len()], unsigned.as_slice());
        assert_eq!(unsigned, canonical_bytes(&block.unsigned()));
    }

    #[test]
    fn test_canonical_hash_deterministic() {
        let provider = Ed25519Provider::new();
        let block = sample_block();

        let h1 = canonical_hash(&provider, &block);
        let h2 = canonical_hash(&provider, &block.clone());
        assert_eq!(h1, h2);

        let s1 = canonical_signature_hash(&provider, &block);
        let s2 = canonical_signature_hash(&provider, &block);
        assert_eq!(s1, s2);
        assert_ne!(h1, s1);
    }

    #[test]
    fn test_signature_hash_ignores_signature() {
        let provider = Ed25519Provider::new();
        let keypair = provider.keypair_from_seed(&[0x42; 32]);

        let signed = BlockBuilder::new(2, 1)
            .timestamp(1_700_000_000)
            .data(b"payload".to_vec())
            .owner(keypair.public_key.clone())
            .sign(&provider, &keypair.private_key)
            .unwrap();

        assert_eq!(
            canonical_signature_hash(&provider, &signed),
            canonical_signature_hash(&provider, &signed.unsigned())
        );
        assert_eq!(signed.signature.hash, canonical_signature_hash(&provider, &signed));
    }

    #[test]
    fn test_every_field_changes_hash() {
        let provider = Ed25519Provider::new();
        let base = sample_block();
        let base_hash = canonical_hash(&provider, &base);

        let variants = [
            Block { id: 2, ..base.clone() },
            Block { prev_id: 9, ..base.clone() },
            Block { timestamp: 0x11, ..base.clone() },
            Block { nonce: Bytes::from_static(&[0xcd]), ..base.clone() },
            Block { prev_hash: Bytes::from_static(&[0xab]), ..base.clone() },
            Block { owner: Bytes::from_static(&[0xbc]), ..base.clone() },
            Block { data: Bytes::from_static(b"ho"), ..base.clone() },
        ];

        for variant in variants {
            assert_ne!(canonical_hash(&provider, &variant), base_hash);
        }
    }

    #[test]
    fn test_fixed_prefix_width() {
        let block = Block::default();
        assert_eq!(canonical_bytes(&block).len(), FIXED_PREFIX_LEN);
    }
}
