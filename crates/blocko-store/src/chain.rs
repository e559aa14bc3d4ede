//! In-memory chain store.
//!
//! An ordered, append-only sequence of blocks with an id index, the chain's
//! identity string and the next-id counter. The store never validates
//! signatures; callers validate before appending. It does enforce that ids
//! strictly increase.

use std::collections::HashMap;

use blocko_core::{Block, BlockLookup};

use crate::error::{Result, StoreError};

/// Append-only block store for a single chain.
#[derive(Debug, Clone, Default)]
pub struct ChainStore {
    /// Chain identity, bound into the genesis pre-image.
    name: String,

    /// Id the next minted block will carry.
    next_id: u32,

    /// Blocks in commit order.
    blocks: Vec<Block>,

    /// Id -> position in `blocks`.
    index: HashMap<u32, usize>,
}

impl ChainStore {
    /// Create an empty store for the named chain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: 0,
            blocks: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks in commit order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The most recently committed block.
    pub fn head(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Get a block by id.
    pub fn get(&self, id: u32) -> Option<&Block> {
        self.index.get(&id).map(|&pos| &self.blocks[pos])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    /// Check that `id` may be appended after the current head.
    pub fn check_monotonic(&self, id: u32) -> Result<()> {
        match self.head() {
            Some(last) if id <= last.id => Err(StoreError::NonMonotonicId { last: last.id, got: id }),
            _ => Ok(()),
        }
    }

    /// Append an already-validated block without touching `next_id`.
    ///
    /// Used when rebuilding a store from a container.
    pub fn append(&mut self, block: Block) -> Result<()> {
        self.check_monotonic(block.id)?;
        self.push(block);
        Ok(())
    }

    /// Commit a freshly minted block.
    ///
    /// The block must carry `next_id`. On success `next_id` advances by one;
    /// on failure nothing changes.
    pub fn commit(&mut self, block: Block) -> Result<()> {
        if block.id != self.next_id {
            return Err(StoreError::NotNextId {
                expected: self.next_id,
                got: block.id,
            });
        }
        let next = self
            .next_id
            .checked_add(1)
            .ok_or(StoreError::IdSpaceExhausted)?;
        self.check_monotonic(block.id)?;

        self.push(block);
        self.next_id = next;
        Ok(())
    }

    /// Point `next_id` one past the head (0 for an empty store).
    pub fn resume_after_head(&mut self) {
        self.next_id = self
            .head()
            .map(|b| b.id.saturating_add(1))
            .unwrap_or(0);
    }

    fn push(&mut self, block: Block) {
        tracing::debug!(id = block.id, prev_id = block.prev_id, "block appended");
        self.index.insert(block.id, self.blocks.len());
        self.blocks.push(block);
    }
}

impl BlockLookup for ChainStore {
    fn find_block(&self, id: u32) -> Option<&Block> {
        self.get(id)
    }
}
