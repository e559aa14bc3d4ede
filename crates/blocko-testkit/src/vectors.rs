//! Golden test vectors for the canonical pre-image.
//!
//! These vectors pin the exact byte layout that hashing and signing consume,
//! so any implementation can check itself against them.

use bytes::Bytes;

use blocko_core::{
    canonical_bytes, canonical_signature_bytes, canonical_signature_hash, Block, BlockSignature,
    CryptoProvider, Ed25519Provider,
};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct CanonicalVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub id: u32,
    pub prev_id: u32,
    pub timestamp: u64,
    pub prev_hash: &'static [u8],
    pub owner: &'static [u8],
    pub nonce: &'static [u8],
    pub data: &'static [u8],
    pub signature_hash: &'static [u8],
    pub signature: &'static [u8],
    /// Expected pre-image with the signature fields cleared (hex).
    pub expected_signature_preimage: &'static str,
    /// Expected full pre-image (hex).
    pub expected_preimage: &'static str,
}

impl CanonicalVector {
    /// The block this vector describes.
    pub fn block(&self) -> Block {
        Block {
            id: self.id,
            prev_id: self.prev_id,
            timestamp: self.timestamp,
            nonce: Bytes::from_static(self.nonce),
            prev_hash: Bytes::from_static(self.prev_hash),
            owner: Bytes::from_static(self.owner),
            data: Bytes::from_static(self.data),
            signature: BlockSignature {
                hash: Bytes::from_static(self.signature_hash),
                signature: Bytes::from_static(self.signature),
            },
        }
    }
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<CanonicalVector> {
    vec![
        CanonicalVector {
            name: "empty genesis",
            id: 0,
            prev_id: 0,
            timestamp: 0,
            prev_hash: b"",
            owner: b"",
            nonce: b"",
            data: b"",
            signature_hash: b"",
            signature: b"",
            expected_signature_preimage: "00000000000000000000000000000000",
            expected_preimage: "00000000000000000000000000000000",
        },
        CanonicalVector {
            name: "first block with hello payload",
            id: 1,
            prev_id: 0,
            timestamp: 1_700_000_000,
            prev_hash: &[0xaa; 4],
            owner: &[0xbb; 4],
            nonce: &[0x01, 0x02],
            data: b"hello",
            signature_hash: &[0xcc; 2],
            signature: &[0xdd; 2],
            expected_signature_preimage: concat!(
                "01000000",
                "00000000",
                "00f1536500000000",
                "aaaaaaaa",
                "bbbbbbbb",
                "0102",
                "68656c6c6f",
            ),
            expected_preimage: concat!(
                "01000000",
                "00000000",
                "00f1536500000000",
                "aaaaaaaa",
                "bbbbbbbb",
                "0102",
                "68656c6c6f",
                "cccc",
                "dddd",
            ),
        },
        CanonicalVector {
            name: "maximum integer fields",
            id: u32::MAX,
            prev_id: u32::MAX - 1,
            timestamp: u64::MAX,
            prev_hash: b"",
            owner: b"",
            nonce: b"",
            data: &[0x00, 0xff],
            signature_hash: b"",
            signature: &[0xee],
            expected_signature_preimage: "fffffffffeffffffffffffffffffffff00ff",
            expected_preimage: "fffffffffeffffffffffffffffffffff00ffee",
        },
    ]
}

/// Check every vector against the canonical encoder and check that a block
/// signed over the vector's fields verifies under its signer.
pub fn verify_all_vectors() -> Result<(), String> {
    let provider = Ed25519Provider::new();
    let keypair = provider.keypair_from_seed(&[0x42; 32]);

    for vector in all_vectors() {
        let block = vector.block();

        let preimage = hex::encode(canonical_bytes(&block));
        if preimage != vector.expected_preimage {
            return Err(format!(
                "{}: pre-image {} != expected {}",
                vector.name, preimage, vector.expected_preimage
            ));
        }

        let signature_preimage = hex::encode(canonical_signature_bytes(&block));
        if signature_preimage != vector.expected_signature_preimage {
            return Err(format!(
                "{}: signature pre-image {} != expected {}",
                vector.name, signature_preimage, vector.expected_signature_preimage
            ));
        }

        let digest = canonical_signature_hash(&provider, &block);
        if digest != provider.hash(&canonical_signature_bytes(&block)) {
            return Err(format!("{}: digest is not the hash of the pre-image", vector.name));
        }

        let signature = provider
            .sign(&digest, &keypair.private_key)
            .map_err(|e| format!("{}: {}", vector.name, e))?;
        provider
            .verify(&signature, &digest, &keypair.public_key)
            .map_err(|e| format!("{}: {}", vector.name, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors() {
        verify_all_vectors().unwrap();
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }

    #[test]
    fn test_signature_is_deterministic() {
        let provider = Ed25519Provider::new();
        let keypair = provider.keypair_from_seed(&[0x42; 32]);
        let block = all_vectors()[1].block();
        let digest = canonical_signature_hash(&provider, &block);

        let s1 = provider.sign(&digest, &keypair.private_key).unwrap();
        let s2 = provider.sign(&digest, &keypair.private_key).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(s1.len(), 64);
    }
}
