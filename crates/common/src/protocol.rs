//! Commands accepted by the menu and the result records it prints.
//!
//! The result records are serialised as JSON when the front end runs with
//! `TEXTSEAL_OUTPUT_FORMAT=json`, one object per line.

use serde::{Deserialize, Serialize};

use crate::error::SealError;

// ---------------------------------------------------------------------------
// Menu commands
// ---------------------------------------------------------------------------

/// The closed set of operations the front end dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Seal one line of text.
    Encrypt,
    /// Open a hex blob with a held key.
    Decrypt,
    /// Leave the menu.
    Exit,
}

impl Command {
    /// Parse a menu choice: the item number or its name, case-insensitive.
    ///
    /// Returns `None` for anything else so the caller can re-prompt.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "1" | "e" | "encrypt" => Some(Command::Encrypt),
            "2" | "d" | "decrypt" => Some(Command::Decrypt),
            "3" | "q" | "quit" | "exit" => Some(Command::Exit),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Printed after a successful encryption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// `nonce_hex || ciphertext_hex || tag_hex`.
    pub blob: String,
    /// Id of the key held by this session; never the key itself.
    pub key_id: String,
}

/// Printed after a successful decryption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub plaintext: String,
}

/// Printed for any failed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"malformed_input"`).
    pub code: String,
    /// Human-readable description safe to expose to the user.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&SealError> for ErrorResponse {
    fn from(err: &SealError) -> Self {
        Self::new(err.code(), err.user_message())
    }
}
