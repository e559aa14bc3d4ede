//! Test fixtures and helpers.
//!
//! Build valid, deterministic blocks directly from a seeded key, without
//! going through a `Chain`.

use bytes::Bytes;

use blocko_core::{
    canonical_hash, Block, BlockBuilder, CryptoProvider, Ed25519Provider, KeyPair,
};

/// Timestamp stamped on every fixture block.
pub const FIXTURE_TIMESTAMP: u64 = 1_700_000_000;

/// A seeded signer.
pub struct TestFixture {
    pub provider: Ed25519Provider,
    pub keypair: KeyPair,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        let provider = Ed25519Provider::new();
        let keypair = provider
            .generate_keypair()
            .expect("keypair generation failed");
        Self { provider, keypair }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let provider = Ed25519Provider::new();
        let keypair = provider.keypair_from_seed(&seed);
        Self { provider, keypair }
    }

    pub fn public_key(&self) -> Bytes {
        self.keypair.public_key.clone()
    }

    /// Self-signed genesis block for `name`, owned by this fixture.
    pub fn make_genesis(&self, name: &str) -> Block {
        BlockBuilder::new(0, 0)
            .timestamp(FIXTURE_TIMESTAMP)
            .nonce(vec![0u8; 8])
            .prev_hash(self.provider.hash(name.as_bytes()))
            .owner(self.public_key())
            .sign(&self.provider, &self.keypair.private_key)
            .expect("fixture signing failed")
    }

    /// A block extending `stem`, signed by this fixture and owned by `owner`.
    ///
    /// The result only validates if this fixture holds `stem.owner`.
    pub fn make_block(&self, stem: &Block, id: u32, owner: &[u8], data: &[u8]) -> Block {
        BlockBuilder::new(id, stem.id)
            .timestamp(FIXTURE_TIMESTAMP + id as u64)
            .nonce(id.to_le_bytes().to_vec())
            .prev_hash(canonical_hash(&self.provider, stem))
            .owner(owner.to_vec())
            .data(data.to_vec())
            .sign(&self.provider, &self.keypair.private_key)
            .expect("fixture signing failed")
    }

    /// Genesis followed by one block per payload, each extending the last
    /// and all owned by this fixture.
    pub fn signed_chain(&self, name: &str, payloads: &[&[u8]]) -> Vec<Block> {
        let mut blocks = vec![self.make_genesis(name)];
        for (i, payload) in payloads.iter().enumerate() {
            let stem = &blocks[blocks.len() - 1];
            let block = self.make_block(stem, i as u32 + 1, &self.keypair.public_key, payload);
            blocks.push(block);
        }
        blocks
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for hand-off tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[31] = 0x5a;
            TestFixture::with_seed(seed)
        })
        .collect()
}
