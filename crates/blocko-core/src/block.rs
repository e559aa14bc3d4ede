//! Block: one signed, hash-linked record in the chain.
//!
//! A block names the key allowed to author its successor (`owner`) and is
//! itself signed by the owner named in its predecessor. Once committed it is
//! never edited.

use bytes::Bytes;

use crate::canonical::canonical_signature_hash;
use crate::crypto::CryptoProvider;
use crate::error::CryptoError;

/// Id of the genesis block.
pub const GENESIS_ID: u32 = 0;

/// Digest and signature carried by a block.
///
/// Both fields are empty on an unsigned candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlockSignature {
    /// Canonical signature hash of the block (signature fields cleared).
    pub hash: Bytes,
    /// Signature over `hash` by the predecessor's owner key.
    pub signature: Bytes,
}

impl BlockSignature {
    pub fn is_empty(&self) -> bool {
        self.hash.is_empty() && self.signature.is_empty()
    }
}

/// A complete block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Block {
    /// Unique, monotonically assigned id. Genesis is 0.
    pub id: u32,

    /// Id of the block this one extends (0 for genesis).
    pub prev_id: u32,

    /// Creation time, seconds since the Unix epoch. Untrusted.
    pub timestamp: u64,

    /// Random filler for freshness.
    pub nonce: Bytes,

    /// Canonical hash of the predecessor (genesis: hash of the chain name).
    pub prev_hash: Bytes,

    /// Public key allowed to sign the next block.
    pub owner: Bytes,

    /// Application payload.
    pub data: Bytes,

    pub signature: BlockSignature,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.id == GENESIS_ID
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.hash.is_empty()
    }

    /// Copy of this block with both signature fields cleared.
    pub fn unsigned(&self) -> Block {
        Block {
            signature: BlockSignature::default(),
            ..self.clone()
        }
    }
}

/// Builder for blocks outside the append path (fixtures, forged inputs).
///
/// The chain's own append engine does not use this; it signs through the
/// active [`Signer`](crate::crypto::Signer) and validates before committing.
pub struct BlockBuilder {
    block: Block,
}

impl BlockBuilder {
    /// Start building a block.
    pub fn new(id: u32, prev_id: u32) -> Self {
        Self {
            block: Block {
                id,
                prev_id,
                ..Block::default()
            },
        }
    }

    pub fn timestamp(mut self, ts: u64) -> Self {
        self.block.timestamp = ts;
        self
    }

    pub fn nonce(mut self, nonce: impl Into<Bytes>) -> Self {
        self.block.nonce = nonce.into();
        self
    }

    pub fn prev_hash(mut self, prev_hash: impl Into<Bytes>) -> Self {
        self.block.prev_hash = prev_hash.into();
        self
    }

    pub fn owner(mut self, owner: impl Into<Bytes>) -> Self {
        self.block.owner = owner.into();
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.block.data = data.into();
        self
    }

    /// Return the unsigned block.
    pub fn build(self) -> Block {
        self.block
    }

    /// Compute the signature hash and sign it with `private_key`.
    pub fn sign<P: CryptoProvider + ?Sized>(
        self,
        provider: &P,
        private_key: &[u8],
    ) -> Result<Block, CryptoError> {
        let mut block = self.block;
        let hash = canonical_signature_hash(provider, &block);
        let signature = provider.sign(&hash, private_key)?;
        block.signature = BlockSignature { hash, signature };
        Ok(block)
    }
}
