//! AES-256-GCM-SIV sealing and opening with detached tags.
//!
//! **Algorithm choice:** AES-256-GCM-SIV (RFC 8452) is nonce-misuse-resistant,
//! so an accidental nonce repeat leaks only plaintext equality rather than the
//! authentication key. Nonces are still never repeated under one key; see
//! [`crate::keys`].
//!
//! **Do NOT substitute an unauthenticated mode such as CBC.** Without a tag,
//! ciphertext can be altered undetected.

use aes_gcm_siv::{
    aead::{AeadInPlace, KeyInit},
    Aes256GcmSiv, Nonce as GcmNonce, Tag,
};
use common::SealError;
use zeroize::Zeroize;

use crate::keys::{Key, Nonce};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag (16 bytes = 128 bits).
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` and `nonce`, authenticating
/// `associated_data` alongside it.
///
/// Deterministic: identical inputs give identical output. The caller is
/// responsible for never reusing `nonce` with `key`.
///
/// # Errors
///
/// Returns [`SealError::MalformedInput`] if the plaintext exceeds the
/// cipher's length limit (64 GiB); inputs are bounded long before that.
pub fn seal(
    key: &Key,
    nonce: &Nonce,
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN]), SealError> {
    let cipher = build_cipher(key);
    let mut buffer = plaintext.to_vec();
    match cipher.encrypt_in_place_detached(
        GcmNonce::from_slice(nonce.as_bytes()),
        associated_data,
        &mut buffer,
    ) {
        Ok(tag) => {
            let mut out = [0u8; TAG_LEN];
            out.copy_from_slice(&tag);
            Ok((buffer, out))
        }
        Err(_) => {
            buffer.zeroize();
            Err(SealError::MalformedInput(
                "plaintext exceeds cipher limits".into(),
            ))
        }
    }
}

/// Verify and decrypt `ciphertext`.
///
/// The tag is checked over the whole message before anything is returned;
/// on failure the working buffer is wiped and no plaintext escapes.
///
/// # Errors
///
/// Returns [`SealError::AuthenticationFailed`] for a wrong key, wrong
/// associated data, or any modification of nonce, ciphertext or tag.
pub fn open(
    key: &Key,
    nonce: &Nonce,
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
    associated_data: &[u8],
) -> Result<Vec<u8>, SealError> {
    let cipher = build_cipher(key);
    let mut buffer = ciphertext.to_vec();
    match cipher.decrypt_in_place_detached(
        GcmNonce::from_slice(nonce.as_bytes()),
        associated_data,
        &mut buffer,
        Tag::from_slice(tag),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(SealError::AuthenticationFailed)
        }
    }
}

fn build_cipher(key: &Key) -> Aes256GcmSiv {
    Aes256GcmSiv::new(key.as_bytes().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyManager, NonceMode, OsEntropy};
    use proptest::prelude::*;

    const AD: &[u8] = b"textseal.v1";

    fn random_key() -> Key {
        KeyManager::new(OsEntropy, NonceMode::Random)
            .generate_key()
            .unwrap()
    }

    #[test]
    fn seal_open_round_trip() {
        let key = random_key();
        let nonce = Nonce::from_bytes([7; NONCE_LEN]);
        let (ct, tag) = seal(&key, &nonce, b"hello", AD).unwrap();
        assert_eq!(ct.len(), 5);
        assert_eq!(open(&key, &nonce, &ct, &tag, AD).unwrap(), b"hello");
    }

    #[test]
    fn seal_is_deterministic() {
        let key = Key::from_bytes([1; KEY_LEN]);
        let nonce = Nonce::from_bytes([2; NONCE_LEN]);
        let a = seal(&key, &nonce, b"same", AD).unwrap();
        let b = seal(&key, &nonce, b"same", AD).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_plaintext_still_authenticated() {
        let key = random_key();
        let nonce = Nonce::from_bytes([0; NONCE_LEN]);
        let (ct, mut tag) = seal(&key, &nonce, b"", AD).unwrap();
        assert!(ct.is_empty());
        assert!(open(&key, &nonce, &ct, &tag, AD).unwrap().is_empty());
        tag[0] ^= 1;
        assert_eq!(
            open(&key, &nonce, &ct, &tag, AD),
            Err(SealError::AuthenticationFailed)
        );
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let nonce = Nonce::from_bytes([3; NONCE_LEN]);
        let (ct, tag) = seal(&random_key(), &nonce, b"secret", AD).unwrap();
        assert_eq!(
            open(&random_key(), &nonce, &ct, &tag, AD),
            Err(SealError::AuthenticationFailed)
        );
    }

    #[test]
    fn wrong_nonce_fails_authentication() {
        let key = random_key();
        let (ct, tag) = seal(&key, &Nonce::from_bytes([3; NONCE_LEN]), b"secret", AD).unwrap();
        assert!(open(&key, &Nonce::from_bytes([4; NONCE_LEN]), &ct, &tag, AD).is_err());
    }

    #[test]
    fn associated_data_is_bound() {
        let key = random_key();
        let nonce = Nonce::from_bytes([5; NONCE_LEN]);
        let (ct, tag) = seal(&key, &nonce, b"secret", AD).unwrap();
        assert_eq!(
            open(&key, &nonce, &ct, &tag, b"textseal.v2"),
            Err(SealError::AuthenticationFailed)
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn round_trip_any_plaintext(
            data in prop::collection::vec(any::<u8>(), 0..1024),
            key in prop::array::uniform32(any::<u8>()),
            nonce in prop::array::uniform12(any::<u8>()),
        ) {
            let key = Key::from_bytes(key);
            let nonce = Nonce::from_bytes(nonce);
            let (ct, tag) = seal(&key, &nonce, &data, AD).unwrap();
            prop_assert_eq!(open(&key, &nonce, &ct, &tag, AD).unwrap(), data);
        }

        #[test]
        fn any_flipped_bit_is_detected(
            data in prop::collection::vec(any::<u8>(), 1..128),
            key in prop::array::uniform32(any::<u8>()),
            bit in any::<prop::sample::Index>(),
        ) {
            let key = Key::from_bytes(key);
            let nonce = Nonce::from_bytes([9; NONCE_LEN]);
            let (mut ct, mut tag) = seal(&key, &nonce, &data, AD).unwrap();
            let total_bits = (ct.len() + TAG_LEN) * 8;
            let i = bit.index(total_bits);
            if i / 8 < ct.len() {
                ct[i / 8] ^= 1 << (i % 8);
            } else {
                tag[i / 8 - ct.len()] ^= 1 << (i % 8);
            }
            prop_assert_eq!(
                open(&key, &nonce, &ct, &tag, AD),
                Err(SealError::AuthenticationFailed)
            );
        }
    }
}
