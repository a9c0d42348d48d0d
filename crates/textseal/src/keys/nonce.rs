//! Per-key nonce generation.

use std::collections::HashSet;

use common::SealError;
use serde::Deserialize;
use tracing::warn;

use super::{EntropySource, Nonce};
use crate::crypto::NONCE_LEN;

/// Bytes of a counter-mode nonce taken from a random per-key prefix.
const PREFIX_LEN: usize = NONCE_LEN - COUNTER_LEN;

/// Bytes of a counter-mode nonce holding the big-endian counter.
const COUNTER_LEN: usize = 8;

/// Random draws attempted before a repeating source is given up on.
const MAX_DRAWS: usize = 4;

/// How nonces are produced for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonceMode {
    /// Fresh 96-bit random draw per encryption, checked against every nonce
    /// already issued under the key.
    #[default]
    Random,
    /// Random 32-bit prefix fixed per key followed by a 64-bit counter.
    Counter,
}

/// Nonce state owned by a single key.
#[derive(Debug)]
pub(crate) enum NonceGenerator {
    Random {
        issued: HashSet<[u8; NONCE_LEN]>,
    },
    Counter {
        prefix: [u8; PREFIX_LEN],
        /// `None` once the counter has wrapped.
        next: Option<u64>,
    },
}

impl NonceGenerator {
    pub(crate) fn new<E>(mode: NonceMode, entropy: &E) -> Result<Self, SealError>
    where
        E: EntropySource + ?Sized,
    {
        match mode {
            NonceMode::Random => Ok(Self::Random {
                issued: HashSet::new(),
            }),
            NonceMode::Counter => {
                let mut prefix = [0u8; PREFIX_LEN];
                entropy.fill(&mut prefix)?;
                Ok(Self::Counter {
                    prefix,
                    next: Some(0),
                })
            }
        }
    }

    pub(crate) fn next<E>(&mut self, entropy: &E) -> Result<Nonce, SealError>
    where
        E: EntropySource + ?Sized,
    {
        match self {
            Self::Random { issued } => {
                for _ in 0..MAX_DRAWS {
                    let mut bytes = [0u8; NONCE_LEN];
                    entropy.fill(&mut bytes)?;
                    if issued.insert(bytes) {
                        return Ok(Nonce(bytes));
                    }
                    warn!(issued = issued.len(), "random nonce repeated; redrawing");
                }
                Err(SealError::EntropyUnavailable(
                    "entropy source keeps repeating nonces".into(),
                ))
            }
            Self::Counter { prefix, next } => {
                let counter = next.ok_or(SealError::NonceExhausted)?;
                *next = counter.checked_add(1);
                let mut bytes = [0u8; NONCE_LEN];
                bytes[..PREFIX_LEN].copy_from_slice(prefix);
                bytes[PREFIX_LEN..].copy_from_slice(&counter.to_be_bytes());
                Ok(Nonce(bytes))
            }
        }
    }

    pub(crate) fn issued(&self) -> u64 {
        match self {
            Self::Random { issued } => issued.len() as u64,
            Self::Counter { next: Some(n), .. } => *n,
            Self::Counter { next: None, .. } => u64::MAX,
        }
    }
}
