//! Error taxonomy shared by the sealing core and the menu front end.

use thiserror::Error;

/// Top-level sealing error type.
///
/// Only [`SealError::EntropyUnavailable`] is fatal; every other variant is
/// reported to the caller and the front end carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SealError {
    /// The random source could not supply key or nonce material.
    #[error("entropy unavailable: {0}")]
    EntropyUnavailable(String),

    /// Input was rejected before any cryptographic work: bad hex, wrong
    /// length, oversized plaintext, or a decrypted payload that is not text.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The authentication tag did not verify.
    ///
    /// Deliberately carries no detail: a wrong key, a corrupted blob and a
    /// tampered blob are indistinguishable to the caller.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Every nonce available to a counter-mode key has been issued.
    #[error("nonce space exhausted for this key")]
    NonceExhausted,

    /// The key id does not name a key held by this session.
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

impl SealError {
    /// Returns `true` if the process cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SealError::EntropyUnavailable(_))
    }

    /// Short machine-readable code used in JSON output and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            SealError::EntropyUnavailable(_) => "entropy_unavailable",
            SealError::MalformedInput(_) => "malformed_input",
            SealError::AuthenticationFailed => "authentication_failed",
            SealError::NonceExhausted => "nonce_exhausted",
            SealError::UnknownKey(_) => "unknown_key",
        }
    }

    /// Text that is safe to show an interactive user.
    pub fn user_message(&self) -> String {
        match self {
            SealError::AuthenticationFailed => "Decryption failed.".into(),
            SealError::EntropyUnavailable(_) => {
                "No secure randomness available; cannot continue.".into()
            }
            other => format!("Error: {other}."),
        }
    }
}
