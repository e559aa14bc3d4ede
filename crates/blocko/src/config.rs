//! Chain configuration.

/// Configuration for a [`Chain`](crate::Chain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Random bytes drawn for each new block's nonce.
    pub nonce_len: usize,
    /// Owner keys longer than this are suspicious; front ends should confirm.
    pub owner_key_warn_len: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            nonce_len: 64,
            owner_key_warn_len: 1024,
        }
    }
}

impl ChainConfig {
    /// Whether an owner key of this size should be confirmed before use.
    pub fn owner_key_is_suspicious(&self, owner: &[u8]) -> bool {
        owner.len() > self.owner_key_warn_len
    }
}
