//! `textseal` — seal and open single lines of text with AES-256-GCM-SIV.
//!
//! Layers, leaf first:
//! - [`codec`]: bounded hex encoding.
//! - [`keys`]: key and nonce generation, the in-memory [`keys::KeyRing`].
//! - [`crypto`]: the seal/open contract and the [`crypto::CiphertextBlob`] format.
//! - [`session`]: the text-level [`session::Sealer`] façade.
//! - [`menu`]: the interactive front end.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod keys;
pub mod menu;
pub mod session;
pub mod telemetry;
