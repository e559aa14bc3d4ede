//! The Chain: append engine, genesis creation, persistence and key handling.
//!
//! A [`Chain`] owns its crypto provider, its block store and the locally held
//! keypair. Every mutation is all-or-nothing: a block is built, signed,
//! self-checked and validated against the store before the store changes.

use std::fs;
use std::path::Path;

use bytes::Bytes;

use blocko_core::{
    canonical_hash, canonical_signature_hash, validate_block, Block, BlockSignature,
    CryptoError, CryptoProvider, Ed25519Provider, KeyKind, KeyPair, Signer, ValidationError,
    GENESIS_ID,
};
use blocko_store::{encode_container, ChainStore, CodecError, ContainerDecoder, StoreError};

use crate::config::ChainConfig;
use crate::error::{ChainError, Result};

/// A single append-only chain and the identity that extends it.
pub struct Chain<P: CryptoProvider = Ed25519Provider> {
    /// Hashing, signing and randomness.
    provider: P,
    /// Committed blocks, chain name and next id.
    store: ChainStore,
    /// The locally held signing identity.
    keypair: KeyPair,
    /// Configuration.
    config: ChainConfig,
}

impl Chain<Ed25519Provider> {
    /// Create an empty chain backed by the Ed25519 provider.
    pub fn new(config: ChainConfig) -> Self {
        Self::with_provider(Ed25519Provider::new(), config)
    }
}

impl Default for Chain<Ed25519Provider> {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl<P: CryptoProvider> Chain<P> {
    /// Create an empty chain with an explicit crypto provider.
    pub fn with_provider(provider: P, config: ChainConfig) -> Self {
        Self {
            provider,
            store: ChainStore::new(""),
            keypair: KeyPair::default(),
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The underlying block store.
    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    pub fn name(&self) -> &str {
        self.store.name()
    }

    /// Id the next appended block will carry.
    pub fn next_id(&self) -> u32 {
        self.store.next_id()
    }

    /// All committed blocks in commit order.
    pub fn blocks(&self) -> &[Block] {
        self.store.blocks()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn head(&self) -> Option<&Block> {
        self.store.head()
    }

    /// The locally held keypair.
    pub fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Chain Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a new chain.
    ///
    /// Mints a fresh keypair, builds and self-signs the genesis block and
    /// validates it. Only then are the keypair, name and store replaced; on
    /// failure the chain is left as it was.
    pub fn new_chain(&mut self, name: &str) -> Result<&Block> {
        let keypair = self.provider.generate_keypair()?;
        let signer = Signer::activate(&self.provider, &keypair)?;

        let candidate = Block {
            id: GENESIS_ID,
            prev_id: GENESIS_ID,
            timestamp: now_secs(),
            nonce: self.provider.random_bytes(self.config.nonce_len)?,
            prev_hash: self.provider.hash(name.as_bytes()),
            owner: signer.export_public_key(),
            data: Bytes::new(),
            signature: BlockSignature::default(),
        };
        let genesis = self.sign_candidate(&signer, candidate)?;

        let mut store = ChainStore::new(name);
        validate_block(&self.provider, &genesis, name, &store)
            .map_err(ChainError::AuthorizationMismatch)?;
        store.commit(genesis)?;

        self.keypair = keypair;
        self.store = store;
        tracing::info!(chain = name, "chain created");

        self.store.head().ok_or(ChainError::BlockNotFound(GENESIS_ID))
    }

    /// Extend the chain from `stem`.
    ///
    /// The active keypair must be the key `stem.owner` names. `new_owner`
    /// designates who may sign the next block; when absent or empty the
    /// active public key keeps ownership.
    pub fn create_block(
        &mut self,
        stem: &Block,
        new_owner: Option<&[u8]>,
        data: &[u8],
    ) -> Result<Block> {
        let name = self.store.name();

        // 1. The stem must itself be sound
        validate_block(&self.provider, stem, name, &self.store)
            .map_err(ChainError::InvalidStem)?;

        // 2. Active identity
        let signer = Signer::activate(&self.provider, &self.keypair)?;

        // 3. Effective owner
        let owner = match new_owner {
            Some(owner) if !owner.is_empty() => Bytes::copy_from_slice(owner),
            _ => signer.export_public_key(),
        };

        // 4. Candidate
        let candidate = Block {
            id: self.store.next_id(),
            prev_id: stem.id,
            timestamp: now_secs(),
            nonce: self.provider.random_bytes(self.config.nonce_len)?,
            prev_hash: canonical_hash(&self.provider, stem),
            owner,
            data: Bytes::copy_from_slice(data),
            signature: BlockSignature::default(),
        };

        // 5. Sign and self-check
        let block = self.sign_candidate(&signer, candidate)?;

        // 6. The stem's owner must be the signer
        validate_block(&self.provider, &block, name, &self.store)
            .map_err(ChainError::AuthorizationMismatch)?;

        // 7. Commit
        self.store.commit(block.clone())?;
        Ok(block)
    }

    /// Extend the chain from the stored block `stem_id`.
    pub fn append_to(
        &mut self,
        stem_id: u32,
        new_owner: Option<&[u8]>,
        data: &[u8],
    ) -> Result<Block> {
        let stem = self
            .store
            .get(stem_id)
            .cloned()
            .ok_or(ChainError::BlockNotFound(stem_id))?;
        self.create_block(&stem, new_owner, data)
    }

    /// Validate a block against this chain's name and stored blocks.
    pub fn validate_block(&self, block: &Block) -> std::result::Result<(), ValidationError> {
        validate_block(&self.provider, block, self.store.name(), &self.store)
    }

    /// Get a block by id.
    pub fn find_block(&self, id: u32) -> Option<&Block> {
        self.store.get(id)
    }

    /// Re-validate every stored block, each against the blocks before it.
    pub fn verify_all(&self) -> std::result::Result<(), ValidationError> {
        let blocks = self.store.blocks();
        for (i, block) in blocks.iter().enumerate() {
            validate_block(&self.provider, block, self.store.name(), &blocks[..i])?;
        }
        Ok(())
    }

    fn sign_candidate(&self, signer: &Signer, mut block: Block) -> Result<Block> {
        if !block.signature.hash.is_empty() {
            return Err(ChainError::SigningFailed("block is already signed".into()));
        }

        let hash = canonical_signature_hash(&self.provider, &block);
        let signature = signer.sign(&self.provider, &hash).map_err(|e| match e {
            e @ CryptoError::WrongKeyType { .. } => ChainError::Crypto(e),
            e => ChainError::SigningFailed(e.to_string()),
        })?;

        if hash.is_empty() || signature.is_empty() {
            return Err(ChainError::SigningFailed("empty digest or signature".into()));
        }
        signer
            .verify(&self.provider, &signature, &hash)
            .map_err(|e| ChainError::SigningFailed(format!("self-check failed: {}", e)))?;

        block.signature = BlockSignature { hash, signature };
        Ok(block)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Serialize the chain into a container buffer.
    pub fn export_bytes(&self) -> Bytes {
        encode_container(self.store.name(), self.store.blocks())
    }

    /// Write the chain to `path` in one write call.
    pub fn export_chain(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.export_bytes();
        fs::write(path, &bytes)?;
        tracing::info!(
            path = %path.display(),
            blocks = self.store.len(),
            bytes = bytes.len(),
            "chain exported"
        );
        Ok(())
    }

    /// Rebuild the chain from a container buffer.
    ///
    /// Header and name errors are fatal and leave the chain untouched. After
    /// that the chain is replaced: each record is validated against the
    /// blocks accepted so far, and invalid records are skipped. A truncated
    /// record stops the import but keeps what was accepted. The keypair is
    /// not changed.
    pub fn import_bytes(&mut self, data: &[u8]) -> Result<ImportReport> {
        let mut decoder = ContainerDecoder::open(data)?;
        let mut store = ChainStore::new(decoder.name());
        let mut report = ImportReport {
            name: decoder.name().to_owned(),
            declared: decoder.header().block_count,
            ..ImportReport::default()
        };

        for record in decoder.by_ref() {
            let block = match record {
                Ok(block) => block,
                Err(e) => {
                    tracing::warn!(accepted = report.accepted, "container truncated: {}", e);
                    report.truncated = Some(e);
                    break;
                }
            };

            let id = block.id;
            if let Err(e) = validate_block(&self.provider, &block, store.name(), &store) {
                tracing::warn!(id, reason = e.reason(), "skipping invalid block");
                report.skipped.push(SkippedBlock {
                    id,
                    reason: SkipReason::Invalid(e),
                });
                continue;
            }
            if let Err(e) = store.append(block) {
                tracing::warn!(id, "skipping out-of-order block: {}", e);
                report.skipped.push(SkippedBlock {
                    id,
                    reason: SkipReason::OutOfOrder(e),
                });
                continue;
            }
            report.accepted += 1;
        }

        if report.truncated.is_none() && decoder.trailing_bytes() > 0 {
            tracing::warn!(
                trailing = decoder.trailing_bytes(),
                "ignoring bytes after the last declared block"
            );
        }

        store.resume_after_head();
        if u64::from(store.next_id()) != report.declared {
            tracing::warn!(
                next_id = store.next_id(),
                declared = report.declared,
                "next id does not match the declared block count"
            );
        }

        self.store = store;
        tracing::info!(
            chain = %report.name,
            accepted = report.accepted,
            skipped = report.skipped.len(),
            "chain imported"
        );
        Ok(report)
    }

    /// Read and import the container at `path`.
    pub fn import_chain(&mut self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let data = fs::read(path)?;
        self.import_bytes(&data)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate a fresh keypair. The active keypair is not changed.
    pub fn new_keypair(&self) -> Result<KeyPair> {
        Ok(self.provider.generate_keypair()?)
    }

    /// Replace the active keypair.
    pub fn set_active_keypair(&mut self, keypair: KeyPair) {
        self.keypair = keypair;
    }

    /// Load an externally supplied key as the active identity.
    ///
    /// A private key brings its derived public key along. A public key alone
    /// replaces the keypair with a verify-only identity.
    pub fn import_external_key(&mut self, bytes: &[u8], kind: KeyKind) -> Result<()> {
        let key = self.provider.import_key(bytes, kind)?;
        self.keypair = match kind {
            KeyKind::Private => {
                let public_key = self.provider.public_key_of(&key)?;
                KeyPair::new(public_key, key)
            }
            KeyKind::Public => KeyPair::public_only(key),
        };
        tracing::debug!(%kind, "key imported");
        Ok(())
    }

    /// Read a raw key file and import it.
    pub fn import_key_file(&mut self, path: impl AsRef<Path>, kind: KeyKind) -> Result<()> {
        let bytes = fs::read(path)?;
        self.import_external_key(&bytes, kind)
    }

    /// Write the active public key and, optionally, the private key as raw
    /// bytes.
    pub fn export_keys(
        &self,
        public_path: impl AsRef<Path>,
        private_path: Option<&Path>,
    ) -> Result<()> {
        let signer = Signer::activate(&self.provider, &self.keypair)?;
        fs::write(public_path, signer.export_public_key())?;
        if let Some(path) = private_path {
            fs::write(path, signer.export_private_key()?)?;
        }
        Ok(())
    }
}

/// Why a record was skipped during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The block failed authority validation.
    Invalid(ValidationError),
    /// The block's id does not follow the last accepted id.
    OutOfOrder(StoreError),
}

impl SkipReason {
    pub fn reason(&self) -> &'static str {
        match self {
            SkipReason::Invalid(e) => e.reason(),
            SkipReason::OutOfOrder(_) => "non_monotonic_id",
        }
    }
}

/// A record the import did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlock {
    pub id: u32,
    pub reason: SkipReason,
}

/// Outcome of importing a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Chain name read from the container.
    pub name: String,
    /// Block count the header declared.
    pub declared: u64,
    /// Number of blocks accepted into the chain.
    pub accepted: usize,
    /// Records decoded but not accepted.
    pub skipped: Vec<SkippedBlock>,
    /// Set when a record could not be decoded and the import stopped early.
    pub truncated: Option<CodecError>,
}

impl ImportReport {
    /// Every declared block was decoded and accepted.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.truncated.is_none()
            && self.accepted as u64 == self.declared
    }
}

/// Current time in seconds since the Unix epoch.
fn now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn started(name: &str) -> Chain {
        let mut chain = Chain::default();
        chain.new_chain(name).unwrap();
        chain
    }

    #[test]
    fn test_new_chain() {
        let mut chain = Chain::default();
        let genesis = chain.new_chain("Acme").unwrap().clone();

        assert_eq!(genesis.id, 0);
        assert_eq!(genesis.prev_id, 0);
        assert_eq!(genesis.nonce.len(), 64);
        assert_eq!(genesis.owner, chain.keypair().public_key);
        assert_eq!(genesis.prev_hash, chain.provider().hash(b"Acme"));
        assert_eq!(chain.name(), "Acme");
        assert_eq!(chain.next_id(), 1);
        assert_eq!(chain.len(), 1);
        assert!(chain.validate_block(&genesis).is_ok());
    }

    #[test]
    fn test_new_chain_replaces_previous() {
        let mut chain = started("First");
        chain.append_to(0, None, b"x").unwrap();
        let old_key = chain.keypair().clone();

        chain.new_chain("Second").unwrap();
        assert_eq!(chain.name(), "Second");
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.next_id(), 1);
        assert_ne!(chain.keypair(), &old_key);
    }

    #[test]
    fn test_create_block_defaults_owner_to_signer() {
        let mut chain = started("Acme");
        let genesis = chain.find_block(0).cloned().unwrap();

        let block = chain.create_block(&genesis, None, b"hello").unwrap();
        assert_eq!(block.id, 1);
        assert_eq!(block.prev_id, 0);
        assert_eq!(block.owner, chain.keypair().public_key);
        assert_eq!(block.data.as_ref(), b"hello");
        assert_eq!(block.prev_hash, canonical_hash(chain.provider(), &genesis));
        assert_eq!(chain.next_id(), 2);
    }

    #[test]
    fn test_empty_new_owner_keeps_signer() {
        let mut chain = started("Acme");
        let block = chain.append_to(0, Some(b"".as_slice()), b"x").unwrap();
        assert_eq!(block.owner, chain.keypair().public_key);
    }

    #[test]
    fn test_handoff_requires_new_owner_key() {
        let mut chain = started("Acme");
        let bob = chain.new_keypair().unwrap();

        chain
            .append_to(0, Some(&bob.public_key[..]), b"to bob")
            .unwrap();

        // Alice no longer owns the head
        let result = chain.append_to(1, None, b"still alice");
        assert!(matches!(
            result,
            Err(ChainError::AuthorizationMismatch(
                ValidationError::SignatureInvalid { id: 2 }
            ))
        ));
        assert_eq!(chain.next_id(), 2);

        chain.set_active_keypair(bob);
        let block = chain.append_to(1, None, b"bob").unwrap();
        assert_eq!(block.id, 2);
    }

    #[test]
    fn test_forked_stem_is_allowed() {
        let mut chain = started("Acme");
        chain.append_to(0, None, b"a").unwrap();
        let b = chain.append_to(0, None, b"b").unwrap();
        assert_eq!(b.id, 2);
        assert_eq!(b.prev_id, 0);
        assert!(chain.verify_all().is_ok());
    }

    #[test]
    fn test_invalid_stem() {
        let mut chain = started("Acme");
        let mut stem = chain.find_block(0).cloned().unwrap();
        stem.data = Bytes::from_static(b"tampered");

        let result = chain.create_block(&stem, None, b"x");
        assert!(matches!(
            result,
            Err(ChainError::InvalidStem(ValidationError::HashMismatch { id: 0 }))
        ));
        assert_eq!(chain.next_id(), 1);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_public_only_key_cannot_sign() {
        let mut chain = started("Acme");
        let public = chain.keypair().public_key.clone();
        chain.import_external_key(&public, KeyKind::Public).unwrap();

        let result = chain.append_to(0, None, b"x");
        assert!(matches!(
            result,
            Err(ChainError::Crypto(CryptoError::WrongKeyType { .. }))
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_no_key_loaded() {
        let mut chain = started("Acme");
        chain.set_active_keypair(KeyPair::default());
        let result = chain.append_to(0, None, b"x");
        assert!(matches!(result, Err(ChainError::Crypto(CryptoError::NoKey))));
    }

    #[test]
    fn test_import_private_key_derives_public() {
        let mut chain = started("Acme");
        let other = chain.new_keypair().unwrap();

        chain
            .import_external_key(&other.private_key, KeyKind::Private)
            .unwrap();
        assert_eq!(chain.keypair(), &other);
    }

    #[test]
    fn test_import_bad_key() {
        let mut chain = started("Acme");
        let before = chain.keypair().clone();
        let result = chain.import_external_key(b"short", KeyKind::Private);
        assert!(matches!(
            result,
            Err(ChainError::Crypto(CryptoError::InvalidKey { .. }))
        ));
        assert_eq!(chain.keypair(), &before);
    }

    #[test]
    fn test_append_to_missing_stem() {
        let mut chain = started("Acme");
        assert!(matches!(
            chain.append_to(9, None, b"x"),
            Err(ChainError::BlockNotFound(9))
        ));
    }

    #[test]
    fn test_import_replaces_store_keeps_keypair() {
        let mut source = started("Acme");
        source.append_to(0, None, b"one").unwrap();
        let bytes = source.export_bytes();

        let mut target = started("Other");
        let key = target.keypair().clone();
        let report = target.import_bytes(&bytes).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.accepted, 2);
        assert_eq!(target.name(), "Acme");
        assert_eq!(target.next_id(), 2);
        assert_eq!(target.keypair(), &key);
    }

    #[test]
    fn test_import_bad_header_leaves_chain() {
        let mut chain = started("Acme");
        let result = chain.import_bytes(b"not a container at all, really");
        assert!(matches!(result, Err(ChainError::Codec(CodecError::BadMagic { .. }))));
        assert_eq!(chain.name(), "Acme");
        assert_eq!(chain.len(), 1);
    }

    type CryptoResult<T> = std::result::Result<T, CryptoError>;

    /// Ed25519 with switchable faults: a flipped signature byte and a failing
    /// random source.
    #[derive(Default)]
    struct FaultyProvider {
        inner: Ed25519Provider,
        corrupt_signatures: Cell<bool>,
        fail_random: Cell<bool>,
    }

    impl CryptoProvider for FaultyProvider {
        fn hash(&self, data: &[u8]) -> Bytes {
            self.inner.hash(data)
        }

        fn random_bytes(&self, len: usize) -> CryptoResult<Bytes> {
            if self.fail_random.get() {
                return Err(CryptoError::Random("source exhausted".into()));
            }
            self.inner.random_bytes(len)
        }

        fn generate_keypair(&self) -> CryptoResult<KeyPair> {
            self.inner.generate_keypair()
        }

        fn import_key(&self, bytes: &[u8], kind: KeyKind) -> CryptoResult<Bytes> {
            self.inner.import_key(bytes, kind)
        }

        fn public_key_of(&self, private_key: &[u8]) -> CryptoResult<Bytes> {
            self.inner.public_key_of(private_key)
        }

        fn sign(&self, digest: &[u8], private_key: &[u8]) -> CryptoResult<Bytes> {
            let signature = self.inner.sign(digest, private_key)?;
            if !self.corrupt_signatures.get() {
                return Ok(signature);
            }
            let mut bytes = signature.to_vec();
            if let Some(last) = bytes.last_mut() {
                *last ^= 0x01;
            }
            Ok(Bytes::from(bytes))
        }

        fn verify(&self, signature: &[u8], digest: &[u8], public_key: &[u8]) -> CryptoResult<()> {
            self.inner.verify(signature, digest, public_key)
        }
    }

    fn faulty_started(name: &str) -> Chain<FaultyProvider> {
        let mut chain = Chain::with_provider(FaultyProvider::default(), ChainConfig::default());
        chain.new_chain(name).unwrap();
        chain
    }

    #[test]
    fn test_bad_signature_fails_self_check() {
        let mut chain = faulty_started("Acme");
        let genesis = chain.find_block(0).cloned().unwrap();
        chain.provider().corrupt_signatures.set(true);

        let result = chain.create_block(&genesis, None, b"payload");
        assert!(matches!(result, Err(ChainError::SigningFailed(_))));
        assert_eq!(chain.next_id(), 1);
        assert_eq!(chain.len(), 1);

        chain.provider().corrupt_signatures.set(false);
        let block = chain.create_block(&genesis, None, b"payload").unwrap();
        assert_eq!(block.id, 1);
    }

    #[test]
    fn test_failed_new_chain_leaves_state() {
        let mut chain = faulty_started("Acme");
        chain.append_to(0, None, b"x").unwrap();
        let key = chain.keypair().clone();
        let blocks = chain.blocks().to_vec();

        chain.provider().corrupt_signatures.set(true);
        let result = chain.new_chain("Other");
        assert!(matches!(result, Err(ChainError::SigningFailed(_))));
        assert_eq!(chain.name(), "Acme");
        assert_eq!(chain.keypair(), &key);
        assert_eq!(chain.blocks(), &blocks[..]);
        assert_eq!(chain.next_id(), 2);

        chain.provider().corrupt_signatures.set(false);
        chain.provider().fail_random.set(true);
        let result = chain.new_chain("Other");
        assert!(matches!(result, Err(ChainError::Crypto(CryptoError::Random(_)))));
        assert_eq!(chain.name(), "Acme");
        assert_eq!(chain.keypair(), &key);
        assert_eq!(chain.blocks(), &blocks[..]);
    }

    #[test]
    fn test_random_failure_leaves_next_id() {
        let mut chain = faulty_started("Acme");
        chain.provider().fail_random.set(true);

        let result = chain.append_to(0, None, b"x");
        assert!(matches!(result, Err(ChainError::Crypto(CryptoError::Random(_)))));
        assert_eq!(chain.next_id(), 1);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_owner_key_warning_threshold() {
        let config = ChainConfig::default();
        assert!(!config.owner_key_is_suspicious(&[0u8; 1024]));
        assert!(config.owner_key_is_suspicious(&[0u8; 1025]));
    }
}
