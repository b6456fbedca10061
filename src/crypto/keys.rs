//! Symmetric key material held in memory.
//!
//! Two 256-bit key types exist and are deliberately distinct so one can
//! never be passed where the other is expected:
//! - `VaultKey`: one per vault, wraps every content key in that vault.
//! - `ContentKey`: one per encrypted file, never persisted unwrapped.
//!
//! Both wipe their bytes when dropped.

use std::fmt;

use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec;
use crate::errors::{LegacyVaultError, Result};

/// Length of every symmetric key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

fn random_key_bytes() -> [u8; KEY_LEN] {
    let mut bytes = [0u8; KEY_LEN];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

fn key_from_slice(bytes: &[u8]) -> Option<[u8; KEY_LEN]> {
    if bytes.len() != KEY_LEN {
        return None;
    }
    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(bytes);
    Some(out)
}

/// The per-vault key-wrapping key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Generate a fresh random vault key.
    pub fn generate() -> Self {
        Self {
            bytes: random_key_bytes(),
        }
    }

    /// Create a `VaultKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        key_from_slice(bytes).map(Self::new).ok_or_else(|| {
            LegacyVaultError::MalformedBlob(format!(
                "vault key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Base64 form used for local persistence.
    pub(crate) fn to_text(&self) -> String {
        codec::encode(&self.bytes)
    }

    pub(crate) fn from_text(text: &str) -> Result<Self> {
        let mut raw = codec::decode(text)?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key
    }
}

impl PartialEq for VaultKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for VaultKey {}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}

/// A single-use key protecting one file's bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ContentKey {
    bytes: [u8; KEY_LEN],
}

impl ContentKey {
    /// Generate a fresh random content key.
    pub fn generate() -> Self {
        Self {
            bytes: random_key_bytes(),
        }
    }

    /// Build a key from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        key_from_slice(bytes)
            .map(|bytes| Self { bytes })
            .ok_or(LegacyVaultError::AuthenticationFailure)
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl PartialEq for ContentKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for ContentKey {}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey([REDACTED])")
    }
}
