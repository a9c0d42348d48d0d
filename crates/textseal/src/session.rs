//! [`Sealer`]: the text-level encrypt/decrypt operations the front end calls.

use common::SealError;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::crypto::{self, CiphertextBlob};
use crate::keys::{EntropySource, Key, KeyManager, NonceMode, OsEntropy, SessionKey};

/// The result of sealing with a fresh key.
///
/// The key is handed over exactly once; the caller decides whether to keep it.
#[derive(Debug)]
pub struct Sealed {
    pub blob: CiphertextBlob,
    pub key: SessionKey,
}

/// Stateless sealing façade: no key outlives a call unless the caller keeps it.
#[derive(Debug)]
pub struct Sealer<E = OsEntropy> {
    keys: KeyManager<E>,
    associated_data: Vec<u8>,
    max_plaintext_len: usize,
}

impl Sealer<OsEntropy> {
    /// A sealer drawing from the OS random source.
    pub fn with_os_entropy(
        mode: NonceMode,
        associated_data: impl Into<Vec<u8>>,
        max_plaintext_len: usize,
    ) -> Self {
        Self::new(KeyManager::new(OsEntropy, mode), associated_data, max_plaintext_len)
    }
}

impl<E: EntropySource> Sealer<E> {
    pub fn new(
        keys: KeyManager<E>,
        associated_data: impl Into<Vec<u8>>,
        max_plaintext_len: usize,
    ) -> Self {
        Self {
            keys,
            associated_data: associated_data.into(),
            max_plaintext_len,
        }
    }

    pub fn max_plaintext_len(&self) -> usize {
        self.max_plaintext_len
    }

    /// Seal `plaintext` under a freshly generated key.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::MalformedInput`] for oversized plaintext and
    /// [`SealError::EntropyUnavailable`] if no key or nonce can be drawn.
    pub fn encrypt_text(&self, plaintext: &str) -> Result<Sealed, SealError> {
        self.check_len(plaintext)?;
        let mut key = self.keys.new_session_key()?;
        let blob = self.encrypt_text_with(&mut key, plaintext)?;
        Ok(Sealed { blob, key })
    }

    /// Seal `plaintext` under a key the caller already holds.
    ///
    /// # Errors
    ///
    /// As [`Sealer::encrypt_text`], plus [`SealError::NonceExhausted`] once a
    /// counter-mode key has no nonces left.
    pub fn encrypt_text_with(
        &self,
        key: &mut SessionKey,
        plaintext: &str,
    ) -> Result<CiphertextBlob, SealError> {
        self.check_len(plaintext)?;
        let nonce = self.keys.next_nonce(key)?;
        let (ciphertext, tag) =
            crypto::seal(key.key(), &nonce, plaintext.as_bytes(), &self.associated_data)?;
        debug!(plaintext_len = plaintext.len(), "text sealed");
        Ok(CiphertextBlob {
            nonce,
            ciphertext,
            tag,
        })
    }

    /// Open `blob` with `key` and return the text.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::AuthenticationFailed`] if the blob does not verify
    /// under `key`, and [`SealError::MalformedInput`] if it is larger than
    /// this sealer accepts or the verified payload is not UTF-8.
    pub fn decrypt_text(&self, blob: &CiphertextBlob, key: &Key) -> Result<String, SealError> {
        if blob.ciphertext.len() > self.max_plaintext_len {
            return Err(SealError::MalformedInput(format!(
                "ciphertext is {} bytes, limit is {}",
                blob.ciphertext.len(),
                self.max_plaintext_len
            )));
        }
        let plaintext = crypto::open(
            key,
            &blob.nonce,
            &blob.ciphertext,
            &blob.tag,
            &self.associated_data,
        )
        .map_err(|e| {
            warn!(code = e.code(), "blob failed authentication");
            e
        })?;
        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            SealError::MalformedInput("decrypted payload is not UTF-8 text".into())
        })
    }

    /// Parse a hex blob, bounded by this sealer's plaintext limit.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::MalformedInput`] for anything that is not a
    /// well-formed blob within the limit.
    pub fn decode_blob(&self, text: &str) -> Result<CiphertextBlob, SealError> {
        CiphertextBlob::from_hex(text, self.max_plaintext_len)
    }

    fn check_len(&self, plaintext: &str) -> Result<(), SealError> {
        if plaintext.len() > self.max_plaintext_len {
            return Err(SealError::MalformedInput(format!(
                "plaintext is {} bytes, limit is {}",
                plaintext.len(),
                self.max_plaintext_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::MockEntropySource;

    fn sealer() -> Sealer {
        Sealer::with_os_entropy(NonceMode::Random, "textseal.v1", 1024)
    }

    #[test]
    fn hello_round_trip() {
        let s = sealer();
        let sealed = s.encrypt_text("hello").unwrap();
        assert_eq!(s.decrypt_text(&sealed.blob, sealed.key.key()).unwrap(), "hello");
    }

    #[test]
    fn hello_with_wrong_key_fails() {
        let s = sealer();
        let sealed = s.encrypt_text("hello").unwrap();
        let other = s.encrypt_text("other").unwrap();
        assert_eq!(
            s.decrypt_text(&sealed.blob, other.key.key()),
            Err(SealError::AuthenticationFailed)
        );
    }

    #[test]
    fn round_trip_through_hex() {
        let s = sealer();
        let sealed = s.encrypt_text("über café ✓").unwrap();
        let blob = s.decode_blob(&sealed.blob.to_hex()).unwrap();
        assert_eq!(s.decrypt_text(&blob, sealed.key.key()).unwrap(), "über café ✓");
    }

    #[test]
    fn each_encryption_gets_a_fresh_key() {
        let s = sealer();
        let a = s.encrypt_text("same").unwrap();
        let b = s.encrypt_text("same").unwrap();
        assert_ne!(a.key.key().as_bytes(), b.key.key().as_bytes());
        assert_ne!(a.blob.ciphertext, b.blob.ciphertext);
    }

    #[test]
    fn reused_key_draws_new_nonces() {
        let s = Sealer::with_os_entropy(NonceMode::Counter, "textseal.v1", 1024);
        let mut sealed = s.encrypt_text("one").unwrap();
        let second = s.encrypt_text_with(&mut sealed.key, "two").unwrap();
        assert_ne!(sealed.blob.nonce, second.nonce);
        assert_eq!(sealed.key.nonces_issued(), 2);
        assert_eq!(s.decrypt_text(&second, sealed.key.key()).unwrap(), "two");
        assert_eq!(s.decrypt_text(&sealed.blob, sealed.key.key()).unwrap(), "one");
    }

    #[test]
    fn oversized_plaintext_rejected_before_key_generation() {
        let mut entropy = MockEntropySource::new();
        entropy.expect_fill().never();
        let s = Sealer::new(KeyManager::new(entropy, NonceMode::Random), "ad", 4);
        assert!(matches!(
            s.encrypt_text("12345"),
            Err(SealError::MalformedInput(_))
        ));
    }

    #[test]
    fn plaintext_at_limit_accepted() {
        let s = Sealer::with_os_entropy(NonceMode::Random, "ad", 4);
        assert!(s.encrypt_text("1234").is_ok());
    }

    #[test]
    fn entropy_failure_surfaces() {
        let mut entropy = MockEntropySource::new();
        entropy
            .expect_fill()
            .returning(|_| Err(SealError::EntropyUnavailable("no device".into())));
        let s = Sealer::new(KeyManager::new(entropy, NonceMode::Random), "ad", 64);
        let err = s.encrypt_text("hi").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn different_context_label_fails() {
        let a = Sealer::with_os_entropy(NonceMode::Random, "textseal.v1", 64);
        let b = Sealer::with_os_entropy(NonceMode::Random, "other.v1", 64);
        let sealed = a.encrypt_text("bound").unwrap();
        assert_eq!(
            b.decrypt_text(&sealed.blob, sealed.key.key()),
            Err(SealError::AuthenticationFailed)
        );
    }

    #[test]
    fn non_utf8_payload_is_malformed() {
        let s = sealer();
        let key = s.encrypt_text("x").unwrap().key;
        let nonce = crate::keys::Nonce::from_bytes([1; crate::crypto::NONCE_LEN]);
        let (ciphertext, tag) =
            crypto::seal(key.key(), &nonce, &[0xFF, 0xFE], b"textseal.v1").unwrap();
        let blob = CiphertextBlob {
            nonce,
            ciphertext,
            tag,
        };
        assert!(matches!(
            s.decrypt_text(&blob, key.key()),
            Err(SealError::MalformedInput(_))
        ));
    }
}
