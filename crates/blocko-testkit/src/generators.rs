//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;

use blocko_core::{Block, BlockBuilder, Ed25519Provider, KeyPair};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = KeyPair> {
    any::<[u8; 32]>().prop_map(|seed| Ed25519Provider::new().keypair_from_seed(&seed))
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a non-empty chain name.
pub fn chain_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _-]{0,31}".prop_map(String::from)
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = u64> {
    0u64..=4_102_444_800
}

/// Parameters for generating a signed block.
#[derive(Debug, Clone)]
pub struct BlockParams {
    pub keypair: KeyPair,
    pub id: u32,
    pub prev_id: u32,
    pub timestamp: u64,
    pub nonce: Vec<u8>,
    pub prev_hash: Vec<u8>,
    pub data: Vec<u8>,
}

impl Arbitrary for BlockParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            keypair(),
            any::<u32>(),
            any::<u32>(),
            timestamp(),
            payload(64),
            prop::collection::vec(any::<u8>(), 32),
            payload(512),
        )
            .prop_map(
                |(keypair, id, prev_id, timestamp, nonce, prev_hash, data)| BlockParams {
                    keypair,
                    id,
                    prev_id,
                    timestamp,
                    nonce,
                    prev_hash,
                    data,
                },
            )
            .boxed()
    }
}

/// Generate a block signed by its own owner key.
pub fn block_from_params(params: &BlockParams) -> Block {
    let provider = Ed25519Provider::new();
    BlockBuilder::new(params.id, params.prev_id)
        .timestamp(params.timestamp)
        .nonce(params.nonce.clone())
        .prev_hash(params.prev_hash.clone())
        .owner(params.keypair.public_key.clone())
        .data(params.data.clone())
        .sign(&provider, &params.keypair.private_key)
        .expect("generated keypair must sign")
}

/// A single-field modification of a signed block.
#[derive(Debug, Clone)]
pub enum Tamper {
    Data(Vec<u8>),
    Owner(Vec<u8>),
    Timestamp(u64),
    Nonce(Vec<u8>),
}

impl Tamper {
    /// Apply the modification. Returns `false` when it would not change the
    /// block.
    pub fn apply(&self, block: &mut Block) -> bool {
        match self {
            Tamper::Data(v) => replace(&mut block.data, v),
            Tamper::Owner(v) => replace(&mut block.owner, v),
            Tamper::Nonce(v) => replace(&mut block.nonce, v),
            Tamper::Timestamp(ts) => {
                let changed = block.timestamp != *ts;
                block.timestamp = *ts;
                changed
            }
        }
    }
}

fn replace(field: &mut Bytes, value: &[u8]) -> bool {
    let changed = field.as_ref() != value;
    *field = Bytes::copy_from_slice(value);
    changed
}

/// Generate a tamper over any of the signed fields.
pub fn tamper() -> impl Strategy<Value = Tamper> {
    prop_oneof![
        payload(64).prop_map(Tamper::Data),
        payload(64).prop_map(Tamper::Owner),
        timestamp().prop_map(Tamper::Timestamp),
        payload(64).prop_map(Tamper::Nonce),
    ]
}
