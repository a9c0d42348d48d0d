//! [`CiphertextBlob`]: everything needed to attempt decryption except the key.

use common::SealError;

use super::cipher::{NONCE_LEN, TAG_LEN};
use crate::codec;
use crate::keys::Nonce;

/// A sealed message.
///
/// The transport form is `hex(nonce) || hex(ciphertext) || hex(tag)`; the
/// nonce and tag fields are fixed-width, so the split is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiphertextBlob {
    pub nonce: Nonce,
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl CiphertextBlob {
    /// Encode this blob to its hex transport form.
    pub fn to_hex(&self) -> String {
        let mut raw = Vec::with_capacity(NONCE_LEN + self.ciphertext.len() + TAG_LEN);
        raw.extend_from_slice(self.nonce.as_bytes());
        raw.extend_from_slice(&self.ciphertext);
        raw.extend_from_slice(&self.tag);
        codec::encode_hex(&raw)
    }

    /// Parse the hex transport form of a blob whose plaintext is at most
    /// `max_plaintext_len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::MalformedInput`] if the text is not valid hex,
    /// is too long for `max_plaintext_len`, or is too short to hold a nonce
    /// and a tag.
    pub fn from_hex(text: &str, max_plaintext_len: usize) -> Result<Self, SealError> {
        let raw = codec::decode_hex(text, NONCE_LEN + max_plaintext_len + TAG_LEN)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(SealError::MalformedInput(format!(
                "blob is {} bytes, shorter than nonce and tag ({})",
                raw.len(),
                NONCE_LEN + TAG_LEN
            )));
        }

        let (nonce_bytes, rest) = raw.split_at(NONCE_LEN);
        let (ciphertext, tag_bytes) = rest.split_at(rest.len() - TAG_LEN);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(tag_bytes);

        Ok(Self {
            nonce: Nonce::from_bytes(nonce),
            ciphertext: ciphertext.to_vec(),
            tag,
        })
    }
}
