//! Local cache of vault keys and unlocked identity keys.
//!
//! `KeyStore` sits on top of any `KeyValueStore` backend and adds:
//! - identifier validation,
//! - generate-on-demand for vault keys (`ensure`) that can never produce
//!   two different keys for the same vault,
//! - caching of keys obtained through a recovery path.
//!
//! Entry names: `vault-key.<vault_id>` and `identity.<user_id>`.

pub mod backend;
pub mod file;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::crypto::keys::VaultKey;
use crate::crypto::seal::IdentityKeyPair;
use crate::codec;
use crate::errors::{LegacyVaultError, Result};

pub use backend::{KeyValueStore, MemoryStore};
pub use file::FileStore;

const VAULT_KEY_PREFIX: &str = "vault-key.";
const IDENTITY_PREFIX: &str = "identity.";

/// Maximum identifier length in bytes.
const MAX_ID_LEN: usize = 256;

/// Validate a vault or user identifier.
///
/// Allowed: ASCII letters, digits, underscores, hyphens, periods and `@`.
/// Must be non-empty, at most 256 characters, and must not start with a
/// period (entries starting with `.` are reserved for temp files).
pub fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(LegacyVaultError::InvalidIdentifier(
            "identifier cannot be empty".into(),
        ));
    }
    if id.len() > MAX_ID_LEN {
        return Err(LegacyVaultError::InvalidIdentifier(format!(
            "identifier cannot exceed {MAX_ID_LEN} characters"
        )));
    }
    if id.starts_with('.') {
        return Err(LegacyVaultError::InvalidIdentifier(format!(
            "identifier '{id}' cannot start with a period"
        )));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'@'))
    {
        return Err(LegacyVaultError::InvalidIdentifier(format!(
            "identifier '{id}' contains invalid characters; only ASCII letters, digits, '_', '-', '.', and '@' are allowed"
        )));
    }
    Ok(())
}

fn vault_entry(vault_id: &str) -> Result<String> {
    validate_identifier(vault_id)?;
    Ok(format!("{VAULT_KEY_PREFIX}{vault_id}"))
}

fn identity_entry(user_id: &str) -> Result<String> {
    validate_identifier(user_id)?;
    Ok(format!("{IDENTITY_PREFIX}{user_id}"))
}

fn parse_vault_key(vault_id: &str, text: &str) -> Result<VaultKey> {
    VaultKey::from_text(text).map_err(|_| {
        LegacyVaultError::StorageFailure(format!(
            "stored vault key for '{vault_id}' is unreadable; recover it again or run `legacyvault key forget {vault_id}`"
        ))
    })
}

/// Per-vault key cache with serialized generation.
pub struct KeyStore<S> {
    backend: S,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: KeyValueStore> KeyStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn lock_for(&self, entry: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .lock()
                .entry(entry.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    // ------------------------------------------------------------------
    // Vault keys
    // ------------------------------------------------------------------

    /// Return the locally stored vault key, never generating one.
    ///
    /// `None` means the key has to be recovered.
    pub fn get(&self, vault_id: &str) -> Result<Option<VaultKey>> {
        let entry = vault_entry(vault_id)?;
        self.backend
            .get(&entry)?
            .map(|text| parse_vault_key(vault_id, &text))
            .transpose()
    }

    /// Like [`get`](Self::get), but a stored entry that no longer parses
    /// counts as absent. Backend errors still propagate.
    pub fn get_intact(&self, vault_id: &str) -> Result<Option<VaultKey>> {
        let entry = vault_entry(vault_id)?;
        match self.backend.get(&entry)? {
            Some(text) => match VaultKey::from_text(&text) {
                Ok(key) => Ok(Some(key)),
                Err(_) => {
                    warn!(vault_id, "stored vault key is unreadable");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Return the stored vault key, generating and persisting one first
    /// if the vault has none.
    ///
    /// Concurrent callers for the same vault are serialized; a caller
    /// that loses the race gets the winner's key. A corrupt stored entry
    /// is reported, never silently replaced.
    pub fn ensure(&self, vault_id: &str) -> Result<VaultKey> {
        let entry = vault_entry(vault_id)?;
        let lock = self.lock_for(&entry);
        let _guard = lock.lock();

        if let Some(text) = self.backend.get(&entry)? {
            return parse_vault_key(vault_id, &text);
        }

        let key = VaultKey::generate();
        match self.backend.put_if_absent(&entry, &key.to_text())? {
            None => {
                info!(vault_id, "generated new vault key");
                Ok(key)
            }
            Some(existing) => {
                debug!(vault_id, "vault key created concurrently, using stored key");
                parse_vault_key(vault_id, &existing)
            }
        }
    }

    /// Cache a vault key obtained through recovery.
    ///
    /// Storing the same key again is a no-op. Storing a *different* key
    /// over an existing one is refused with `StorageFailure`: a vault has
    /// exactly one key and replacing it would orphan every file. An
    /// existing entry that does not parse is overwritten.
    pub fn put(&self, vault_id: &str, key: &VaultKey) -> Result<()> {
        let entry = vault_entry(vault_id)?;
        let lock = self.lock_for(&entry);
        let _guard = lock.lock();

        match self.backend.put_if_absent(&entry, &key.to_text())? {
            None => {
                info!(vault_id, "cached vault key");
                Ok(())
            }
            Some(existing) => match VaultKey::from_text(&existing) {
                Ok(stored) if stored == *key => Ok(()),
                Ok(_) => {
                    warn!(vault_id, "refusing to replace a different stored vault key");
                    Err(LegacyVaultError::StorageFailure(format!(
                        "a different vault key is already stored for '{vault_id}'"
                    )))
                }
                Err(_) => {
                    warn!(vault_id, "replacing unreadable stored vault key");
                    self.backend.put(&entry, &key.to_text())?;
                    Ok(())
                }
            },
        }
    }

    /// Drop the local copy of a vault key. Returns `false` if none was stored.
    pub fn forget(&self, vault_id: &str) -> Result<bool> {
        let entry = vault_entry(vault_id)?;
        let lock = self.lock_for(&entry);
        let _guard = lock.lock();
        self.backend.remove(&entry)
    }

    /// Identifiers of every vault with a locally stored key.
    pub fn vault_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .names()?
            .into_iter()
            .filter_map(|name| name.strip_prefix(VAULT_KEY_PREFIX).map(str::to_string))
            .collect())
    }

    // ------------------------------------------------------------------
    // Identity keys
    // ------------------------------------------------------------------

    /// Store an unlocked identity keypair for `user_id`, replacing any
    /// previous one.
    pub fn put_identity(&self, user_id: &str, identity: &IdentityKeyPair) -> Result<()> {
        let entry = identity_entry(user_id)?;
        let secret = identity.secret_bytes();
        self.backend.put(&entry, &codec::encode(&secret[..]))?;
        debug!(user_id, "cached identity key");
        Ok(())
    }

    /// The locally unlocked identity for `user_id`, if any.
    pub fn identity(&self, user_id: &str) -> Result<Option<IdentityKeyPair>> {
        let entry = identity_entry(user_id)?;
        let Some(text) = self.backend.get(&entry)? else {
            return Ok(None);
        };

        let unreadable = || {
            LegacyVaultError::StorageFailure(format!(
                "stored identity key for '{user_id}' is unreadable"
            ))
        };
        let raw = zeroize::Zeroizing::new(codec::decode(&text).map_err(|_| unreadable())?);
        IdentityKeyPair::from_secret_slice(&raw)
            .map(Some)
            .map_err(|_| unreadable())
    }

    /// Drop the local copy of an identity key.
    pub fn forget_identity(&self, user_id: &str) -> Result<bool> {
        let entry = identity_entry(user_id)?;
        self.backend.remove(&entry)
    }
}
