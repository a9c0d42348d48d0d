//! Key and nonce generation with scoped, zeroizing lifetimes.
//!
//! # Lifecycle
//!
//! 1. [`KeyManager::new_session_key`] draws a fresh 256-bit [`Key`] from the
//!    [`EntropySource`] and pairs it with its own nonce generator.
//! 2. Every encryption under that key takes its nonce from
//!    [`KeyManager::next_nonce`], so a (key, nonce) pair is never issued twice.
//! 3. Dropping the [`SessionKey`] (or releasing it from the [`KeyRing`])
//!    overwrites the key bytes with zeroes.
//!
//! # Security invariants
//!
//! - Key bytes are **never** logged, printed, or included in `Debug` output.
//! - There is no process-wide key: each encryption gets its own key unless
//!   the caller explicitly reuses a [`SessionKey`].

pub mod nonce;
pub mod ring;

pub use nonce::NonceMode;
pub use ring::{KeyHandle, KeyRing};

use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};
use common::SealError;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{KEY_LEN, NONCE_LEN};
use nonce::NonceGenerator;

/// Source of cryptographically strong random bytes.
#[cfg_attr(test, mockall::automock)]
pub trait EntropySource {
    /// Fill `dest` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::EntropyUnavailable`] if the source cannot
    /// supply randomness. Callers must not retry silently.
    fn fill(&self, dest: &mut [u8]) -> Result<(), SealError>;
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), SealError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| SealError::EntropyUnavailable(e.to_string()))
    }
}

/// A 256-bit AES key. Zeroized on drop; deliberately not `Clone`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// Wrap existing key material.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}

/// A 96-bit AEAD nonce. Not secret, but never repeated under one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// A key together with the generator that owns its nonce space.
pub struct SessionKey {
    key: Key,
    nonces: NonceGenerator,
}

impl SessionKey {
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Number of nonces issued under this key so far.
    pub fn nonces_issued(&self) -> u64 {
        self.nonces.issued()
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("key", &self.key)
            .field("nonces_issued", &self.nonces.issued())
            .finish()
    }
}

/// Produces keys and per-key nonces from an [`EntropySource`].
#[derive(Debug, Clone)]
pub struct KeyManager<E = OsEntropy> {
    entropy: E,
    mode: NonceMode,
}

impl<E: EntropySource> KeyManager<E> {
    pub fn new(entropy: E, mode: NonceMode) -> Self {
        Self { entropy, mode }
    }

    pub fn nonce_mode(&self) -> NonceMode {
        self.mode
    }

    /// Draw a fresh random 256-bit key.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::EntropyUnavailable`] if the source fails.
    pub fn generate_key(&self) -> Result<Key, SealError> {
        // Filled in place so a failed draw is still zeroized on drop.
        let mut key = Key([0u8; KEY_LEN]);
        self.entropy.fill(&mut key.0)?;
        Ok(key)
    }

    /// Draw a fresh key and set up its nonce generator.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::EntropyUnavailable`] if the source fails.
    pub fn new_session_key(&self) -> Result<SessionKey, SealError> {
        let key = self.generate_key()?;
        let nonces = NonceGenerator::new(self.mode, &self.entropy)?;
        debug!(mode = ?self.mode, "session key generated");
        Ok(SessionKey { key, nonces })
    }

    /// Issue the next nonce for `session_key`.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::EntropyUnavailable`] if the source fails or keeps
    /// repeating itself, and [`SealError::NonceExhausted`] once a counter-mode
    /// key has used its whole nonce space.
    pub fn next_nonce(&self, session_key: &mut SessionKey) -> Result<Nonce, SealError> {
        session_key.nonces.next(&self.entropy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_keys_differ() {
        let km = KeyManager::new(OsEntropy, NonceMode::Random);
        let k1 = km.generate_key().unwrap();
        let k2 = km.generate_key().unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn key_uses_entropy_bytes() {
        let mut entropy = MockEntropySource::new();
        entropy.expect_fill().times(1).returning(|dest| {
            dest.fill(0x5A);
            Ok(())
        });
        let km = KeyManager::new(entropy, NonceMode::Random);
        assert_eq!(km.generate_key().unwrap().as_bytes(), &[0x5A; KEY_LEN]);
    }

    #[test]
    fn entropy_failure_is_reported_not_retried() {
        let mut entropy = MockEntropySource::new();
        entropy
            .expect_fill()
            .times(1)
            .returning(|_| Err(SealError::EntropyUnavailable("device gone".into())));
        let km = KeyManager::new(entropy, NonceMode::Random);
        let err = km.generate_key().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, SealError::EntropyUnavailable(_)));
    }

    #[test]
    fn key_redacted_in_debug() {
        let key = Key::from_bytes([0xFF; KEY_LEN]);
        let shown = format!("{key:?}");
        assert!(shown.contains("REDACTED"));
        assert!(!shown.contains("255"));
    }

    #[test]
    fn session_key_debug_hides_key() {
        let km = KeyManager::new(OsEntropy, NonceMode::Counter);
        let sk = km.new_session_key().unwrap();
        assert!(format!("{sk:?}").contains("REDACTED"));
    }

    #[test]
    fn key_zeroize_clears_bytes() {
        let mut key = Key::from_bytes([0x11; KEY_LEN]);
        key.zeroize();
        assert_eq!(key.as_bytes(), &[0u8; KEY_LEN]);
    }

    #[test]
    fn nonces_counted_per_session_key() {
        let km = KeyManager::new(OsEntropy, NonceMode::Random);
        let mut a = km.new_session_key().unwrap();
        let b = km.new_session_key().unwrap();
        km.next_nonce(&mut a).unwrap();
        km.next_nonce(&mut a).unwrap();
        assert_eq!(a.nonces_issued(), 2);
        assert_eq!(b.nonces_issued(), 0);
    }
}
