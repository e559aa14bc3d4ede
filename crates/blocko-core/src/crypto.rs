//! Cryptographic capabilities for BlockO.
//!
//! Everything the chain needs from cryptography goes through the
//! [`CryptoProvider`] trait. [`Ed25519Provider`] is the shipped implementation:
//! Ed25519 signatures, Blake3 digests and the thread-local CSPRNG.
//!
//! A [`Signer`] is the active signing identity for one operation. It is built
//! explicitly from a [`KeyPair`] instead of living in shared mutable state.

use bytes::Bytes;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use std::fmt;

use crate::error::CryptoError;

/// Length of a Blake3 digest.
pub const DIGEST_LEN: usize = 32;

/// Length of an Ed25519 public key and of an Ed25519 secret seed.
pub const KEY_LEN: usize = 32;

/// Length of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Which half of a keypair a byte string holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Public,
    Private,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Public => write!(f, "public"),
            KeyKind::Private => write!(f, "private"),
        }
    }
}

/// The locally held signing identity, as exported key bytes.
///
/// Either half may be empty: a keypair loaded from a `.pub` file alone can
/// name an owner but cannot sign.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeyPair {
    pub public_key: Bytes,
    pub private_key: Bytes,
}

impl KeyPair {
    pub fn new(public_key: impl Into<Bytes>, private_key: impl Into<Bytes>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    /// A keypair that only carries a public key.
    pub fn public_only(public_key: impl Into<Bytes>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: Bytes::new(),
        }
    }

    pub fn has_private(&self) -> bool {
        !self.private_key.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.public_key.is_empty() && self.private_key.is_empty()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public = hex::encode(&self.public_key);
        let private = if self.has_private() { "<redacted>" } else { "<none>" };
        write!(
            f,
            "KeyPair(pub={}, private={})",
            &public[..public.len().min(16)],
            private
        )
    }
}

/// The capability set the chain consumes from a cryptography backend.
///
/// Keys and digests are opaque byte strings at this boundary so that blocks
/// can carry them without knowing the algorithm.
pub trait CryptoProvider {
    /// Digest arbitrary bytes.
    fn hash(&self, data: &[u8]) -> Bytes;

    /// Fresh random bytes from a secure source.
    fn random_bytes(&self, len: usize) -> Result<Bytes, CryptoError>;

    /// Generate a new keypair.
    fn generate_keypair(&self) -> Result<KeyPair, CryptoError>;

    /// Parse and check key bytes of the given kind, returning the normalized
    /// key bytes.
    fn import_key(&self, bytes: &[u8], kind: KeyKind) -> Result<Bytes, CryptoError>;

    /// Derive the public key that belongs to a private key.
    fn public_key_of(&self, private_key: &[u8]) -> Result<Bytes, CryptoError>;

    /// Sign a digest with a private key.
    fn sign(&self, digest: &[u8], private_key: &[u8]) -> Result<Bytes, CryptoError>;

    /// Verify a signature over a digest with a public key.
    fn verify(&self, signature: &[u8], digest: &[u8], public_key: &[u8])
        -> Result<(), CryptoError>;
}

/// Ed25519 signatures over Blake3 digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Provider;

impl Ed25519Provider {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn keypair_from_seed(&self, seed: &[u8; KEY_LEN]) -> KeyPair {
        let signing_key = SigningKey::from_bytes(seed);
        KeyPair::new(
            signing_key.verifying_key().to_bytes().to_vec(),
            signing_key.to_bytes().to_vec(),
        )
    }

    fn signing_key(private_key: &[u8]) -> Result<SigningKey, CryptoError> {
        let seed: [u8; KEY_LEN] = private_key.try_into().map_err(|_| CryptoError::InvalidKey {
            kind: KeyKind::Private,
            reason: format!("expected {} bytes, got {}", KEY_LEN, private_key.len()),
        })?;
        Ok(SigningKey::from_bytes(&seed))
    }

    fn verifying_key(public_key: &[u8]) -> Result<VerifyingKey, CryptoError> {
        let bytes: [u8; KEY_LEN] = public_key.try_into().map_err(|_| CryptoError::InvalidKey {
            kind: KeyKind::Public,
            reason: format!("expected {} bytes, got {}", KEY_LEN, public_key.len()),
        })?;
        VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::InvalidKey {
            kind: KeyKind::Public,
            reason: e.to_string(),
        })
    }
}

impl CryptoProvider for Ed25519Provider {
    fn hash(&self, data: &[u8]) -> Bytes {
        Bytes::copy_from_slice(blake3::hash(data).as_bytes())
    }

    fn random_bytes(&self, len: usize) -> Result<Bytes, CryptoError> {
        let mut buf = vec![0u8; len];
        rand::thread_rng()
            .try_fill_bytes(&mut buf)
            .map_err(|e| CryptoError::Random(e.to_string()))?;
        Ok(buf.into())
    }

    fn generate_keypair(&self) -> Result<KeyPair, CryptoError> {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Ok(KeyPair::new(
            signing_key.verifying_key().to_bytes().to_vec(),
            signing_key.to_bytes().to_vec(),
        ))
    }

    fn import_key(&self, bytes: &[u8], kind: KeyKind) -> Result<Bytes, CryptoError> {
        match kind {
            KeyKind::Public => {
                let key = Self::verifying_key(bytes)?;
                Ok(Bytes::copy_from_slice(key.as_bytes()))
            }
            KeyKind::Private => {
                let key = Self::signing_key(bytes)?;
                Ok(key.to_bytes().to_vec().into())
            }
        }
    }

    fn public_key_of(&self, private_key: &[u8]) -> Result<Bytes, CryptoError> {
        let key = Self::signing_key(private_key)?;
        Ok(key.verifying_key().to_bytes().to_vec().into())
    }

    fn sign(&self, digest: &[u8], private_key: &[u8]) -> Result<Bytes, CryptoError> {
        let key = Self::signing_key(private_key)?;
        let signature = key.sign(digest);
        Ok(signature.to_bytes().to_vec().into())
    }

    fn verify(
        &self,
        signature: &[u8],
        digest: &[u8],
        public_key: &[u8],
    ) -> Result<(), CryptoError> {
        let key = Self::verifying_key(public_key)?;
        let sig = Signature::from_slice(signature).map_err(|_| CryptoError::MalformedSignature)?;
        key.verify(digest, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

/// The active signing identity.
///
/// Built from a [`KeyPair`] by [`Signer::activate`], which checks the key
/// bytes with the provider. When a private key is present the public key is
/// always derived from it, so the two halves cannot disagree.
#[derive(Clone)]
pub struct Signer {
    public_key: Bytes,
    private_key: Option<Bytes>,
}

impl Signer {
    /// Load a keypair as the active identity.
    pub fn activate<P: CryptoProvider + ?Sized>(
        provider: &P,
        keypair: &KeyPair,
    ) -> Result<Self, CryptoError> {
        if keypair.has_private() {
            let private_key = provider.import_key(&keypair.private_key, KeyKind::Private)?;
            let public_key = provider.public_key_of(&private_key)?;
            return Ok(Self {
                public_key,
                private_key: Some(private_key),
            });
        }

        if keypair.public_key.is_empty() {
            return Err(CryptoError::NoKey);
        }

        let public_key = provider.import_key(&keypair.public_key, KeyKind::Public)?;
        Ok(Self {
            public_key,
            private_key: None,
        })
    }

    /// The kind of the strongest key loaded.
    pub fn kind(&self) -> KeyKind {
        if self.private_key.is_some() {
            KeyKind::Private
        } else {
            KeyKind::Public
        }
    }

    pub fn export_public_key(&self) -> Bytes {
        self.public_key.clone()
    }

    /// Fails with [`CryptoError::WrongKeyType`] when only a public key is loaded.
    pub fn export_private_key(&self) -> Result<Bytes, CryptoError> {
        self.private_key.clone().ok_or(CryptoError::WrongKeyType {
            expected: KeyKind::Private,
            found: KeyKind::Public,
        })
    }

    /// Sign a digest with the active private key.
    pub fn sign<P: CryptoProvider + ?Sized>(
        &self,
        provider: &P,
        digest: &[u8],
    ) -> Result<Bytes, CryptoError> {
        let private_key = self.export_private_key()?;
        provider.sign(digest, &private_key)
    }

    /// Verify a signature against the active public key.
    pub fn verify<P: CryptoProvider + ?Sized>(
        &self,
        provider: &P,
        signature: &[u8],
        digest: &[u8],
    ) -> Result<(), CryptoError> {
        provider.verify(signature, digest, &self.public_key)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public = hex::encode(&self.public_key);
        write!(f, "Signer({}, {})", &public[..public.len().min(16)], self.kind())
    }
}
