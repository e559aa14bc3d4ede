//! Block validation: hash linkage and one-hop authority delegation.

use crate::block::Block;
use crate::canonical::{canonical_hash, canonical_signature_hash};
use crate::crypto::CryptoProvider;
use crate::error::ValidationError;

/// Source of already-accepted blocks, by id.
///
/// Everything reachable through a lookup is trusted: it was validated when
/// it was committed, or earlier in the same import.
pub trait BlockLookup {
    fn find_block(&self, id: u32) -> Option<&Block>;
}

impl BlockLookup for [Block] {
    fn find_block(&self, id: u32) -> Option<&Block> {
        self.iter().find(|b| b.id == id)
    }
}

/// Validate a block against its chain name and its predecessor.
///
/// This performs, stopping at the first failure:
/// 1. Genesis: `prev_hash == hash(chain_name)`. Otherwise the predecessor
///    must exist and its canonical hash must equal `prev_hash`.
/// 2. The stored signature hash must match the recomputed one.
/// 3. The signature must verify under the predecessor's owner key (genesis:
///    its own owner key).
///
/// Only one hop is checked. Ancestors are not re-walked.
pub fn validate_block<P, L>(
    provider: &P,
    block: &Block,
    chain_name: &str,
    lookup: &L,
) -> Result<(), ValidationError>
where
    P: CryptoProvider + ?Sized,
    L: BlockLookup + ?Sized,
{
    // 1. Linkage and key selection
    let authority = if block.is_genesis() {
        if provider.hash(chain_name.as_bytes()) != block.prev_hash {
            return Err(ValidationError::GenesisMismatch);
        }
        &block.owner
    } else {
        let predecessor =
            lookup
                .find_block(block.prev_id)
                .ok_or(ValidationError::PredecessorMissing {
                    id: block.id,
                    prev_id: block.prev_id,
                })?;

        if canonical_hash(provider, predecessor) != block.prev_hash {
            return Err(ValidationError::ChainBroken {
                id: block.id,
                prev_id: block.prev_id,
            });
        }
        &predecessor.owner
    };

    // 2. Tamper check over the full payload
    if canonical_signature_hash(provider, block) != block.signature.hash {
        return Err(ValidationError::HashMismatch { id: block.id });
    }

    // 3. Delegated signature
    provider
        .verify(&block.signature.signature, &block.signature.hash, authority)
        .map_err(|_| ValidationError::SignatureInvalid { id: block.id })
}
