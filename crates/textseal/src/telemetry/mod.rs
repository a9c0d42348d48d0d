//! Structured logging setup.
//!
//! Logs go to stderr as JSON so that stdout carries only the menu.
//!
//! # Telemetry invariants
//!
//! - **No key material, plaintext, or ciphertext** may appear in any log
//!   field. Lengths, key ids, and error codes are fine.
//! - Log level is configurable via `TEXTSEAL_LOG_LEVEL` (default: `warn`);
//!   `RUST_LOG` takes precedence when set.

pub mod init;

pub use init::init_telemetry;
