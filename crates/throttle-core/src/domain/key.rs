//! Identifier and storage key derivation.

use std::fmt;

use sha2::{Digest, Sha256};

/// Namespace prepended to every storage key.
pub const KEY_NAMESPACE: &str = "throttle:";

/// Caller-supplied name of the throttled operation and actor,
/// e.g. `"feed:203.0.113.5"`.
///
/// A blank identifier (empty or whitespace only) disables throttling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Derive the storage key, or `None` for a blank identifier.
    pub fn storage_key(&self) -> Option<StorageKey> {
        StorageKey::derive(self)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<Option<String>> for Identifier {
    fn from(value: Option<String>) -> Self {
        Self(value.unwrap_or_default())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed-length store key: namespace plus the hex SHA-256 of the identifier.
///
/// Keeps raw identifiers (client IPs, card fingerprints) out of the store's
/// key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn derive(identifier: &Identifier) -> Option<Self> {
        if identifier.is_blank() {
            return None;
        }

        let digest = Sha256::digest(identifier.as_str().as_bytes());
        Some(Self(format!("{}{}", KEY_NAMESPACE, hex::encode(digest))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
