//! [`KeyRing`]: the front end's in-memory store of session keys.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use common::SealError;
use uuid::Uuid;

use super::SessionKey;

/// Opaque, printable name for a key held in a [`KeyRing`].
///
/// Carries no key material; safe to show the user and to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyHandle(Uuid);

impl KeyHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for KeyHandle {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| SealError::MalformedInput(format!("not a key id: {:?}", s.trim())))
    }
}

/// Session keys held for the lifetime of one front-end run.
///
/// Keys leave the ring only by [`KeyRing::release`] or when the ring is
/// dropped; either way their bytes are zeroized.
#[derive(Debug, Default)]
pub struct KeyRing {
    keys: HashMap<KeyHandle, SessionKey>,
}

impl KeyRing {
    /// Create a new, empty [`KeyRing`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `key` and return the handle that names it.
    pub fn insert(&mut self, key: SessionKey) -> KeyHandle {
        let mut handle = KeyHandle::new();
        while self.keys.contains_key(&handle) {
            handle = KeyHandle::new();
        }
        self.keys.insert(handle, key);
        handle
    }

    /// Borrow the key named by `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::UnknownKey`] if the ring holds no such key.
    pub fn get(&self, handle: &KeyHandle) -> Result<&SessionKey, SealError> {
        self.keys
            .get(handle)
            .ok_or_else(|| SealError::UnknownKey(handle.to_string()))
    }

    /// Mutably borrow the key named by `handle`, e.g. to draw a nonce.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::UnknownKey`] if the ring holds no such key.
    pub fn get_mut(&mut self, handle: &KeyHandle) -> Result<&mut SessionKey, SealError> {
        self.keys
            .get_mut(handle)
            .ok_or_else(|| SealError::UnknownKey(handle.to_string()))
    }

    /// Drop (and so zeroize) the key named by `handle`.
    ///
    /// Returns `true` if a key was released.
    pub fn release(&mut self, handle: &KeyHandle) -> bool {
        self.keys.remove(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
