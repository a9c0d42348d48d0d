//! AES-256-GCM-SIV authenticated encryption.
//!
//! This module is intentionally free of key generation and I/O. It owns the
//! seal/open contract: nothing is decrypted for the caller unless the tag
//! verifies.
//!
//! # Blob format
//!
//! ```text
//! hex(nonce: 12 bytes) || hex(ciphertext: n bytes) || hex(tag: 16 bytes)
//! ```

pub mod blob;
pub mod cipher;

pub use blob::CiphertextBlob;
pub use cipher::{open, seal, KEY_LEN, NONCE_LEN, TAG_LEN};
