//! Human and JSON renderings of blocks.

use serde::Serialize;

use blocko::{Block, CryptoProvider};

const RULE: &str = "-----------------------------";

/// Multi-line summary of a block.
///
/// The owner key is shown as the hex digest of its bytes, since raw keys are
/// long and may not be printable.
pub fn render_block<P: CryptoProvider + ?Sized>(provider: &P, block: &Block) -> String {
    let predecessor = if block.is_genesis() {
        "null/root".to_string()
    } else {
        block.prev_id.to_string()
    };

    format!(
        "{rule}\n\
         Block [{id}] <- ({predecessor})\n\
         Timestamp @ {timestamp}\n\
         Owner: {owner}\n\
         Data: {data}\n\
         Signature Hash: {hash}\n\
         Nonce: {nonce}\n",
        rule = RULE,
        id = block.id,
        predecessor = predecessor,
        timestamp = block.timestamp,
        owner = hex::encode(provider.hash(&block.owner)),
        data = String::from_utf8_lossy(&block.data),
        hash = hex::encode(&block.signature.hash),
        nonce = hex::encode(&block.nonce),
    )
}

/// JSON shape of a block, with byte fields hex-encoded.
#[derive(Debug, Serialize)]
pub struct BlockView {
    pub id: u32,
    /// Absent for genesis.
    pub prev_id: Option<u32>,
    pub timestamp: u64,
    pub owner: String,
    pub owner_fingerprint: String,
    pub data: String,
    pub prev_hash: String,
    pub nonce: String,
    pub signature: SignatureView,
}

#[derive(Debug, Serialize)]
pub struct SignatureView {
    pub hash: String,
    pub signature: String,
}

impl BlockView {
    pub fn new<P: CryptoProvider + ?Sized>(provider: &P, block: &Block) -> Self {
        Self {
            id: block.id,
            prev_id: (!block.is_genesis()).then_some(block.prev_id),
            timestamp: block.timestamp,
            owner: hex::encode(&block.owner),
            owner_fingerprint: hex::encode(provider.hash(&block.owner)),
            data: String::from_utf8_lossy(&block.data).into_owned(),
            prev_hash: hex::encode(&block.prev_hash),
            nonce: hex::encode(&block.nonce),
            signature: SignatureView {
                hash: hex::encode(&block.signature.hash),
                signature: hex::encode(&block.signature.signature),
            },
        }
    }
}

/// Whole-chain JSON document.
#[derive(Debug, Serialize)]
pub struct ChainView<'a> {
    pub name: &'a str,
    pub blocks: Vec<BlockView>,
}
