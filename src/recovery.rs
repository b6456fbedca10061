//! Obtaining a usable vault key when the local copy is missing.
//!
//! Paths are tried in a fixed order, whatever order the caller lists
//! them in:
//!
//! 1. **Local**: the key store already holds the key.
//! 2. **Sealed**: a sealed key plus the caller's unlocked identity.
//! 3. **Password backup**: the owner's backup blob plus password.
//!
//! The first path that yields a key wins and the key is cached locally.
//! A path that fails cryptographically does not stop the walk, but if
//! nothing succeeds its error is what the caller gets back, unchanged.
//! `KeyUnavailable` means no path was available at all; the vault stays
//! locked until one is.
//!
//! Sealed keys and backups are bound to the vault they were made for, so
//! a blob belonging to another vault fails like a wrong key would. A local
//! entry that no longer parses is skipped and replaced by whichever path
//! succeeds.

use tracing::{debug, info, warn};

use crate::crypto::backup::{vault_key_context, PasswordVault};
use crate::crypto::keys::VaultKey;
use crate::crypto::seal::{self, IdentityKeyPair, SealedKey};
use crate::errors::{LegacyVaultError, Result};
use crate::keystore::{KeyStore, KeyValueStore};

/// Where a recovered vault key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Local,
    Sealed,
    PasswordBackup,
}

/// One way of obtaining the vault key, supplied by the caller after it
/// fetched whatever blobs its role entitles it to.
pub enum RecoveryStrategy<'a> {
    /// A participant's sealed key and their unlocked identity.
    Sealed {
        sealed_key: &'a SealedKey,
        identity: &'a IdentityKeyPair,
    },
    /// The owner's password backup (text blob) and password.
    PasswordBackup { blob: &'a str, password: &'a [u8] },
    /// Nothing to offer; kept so callers can build the list uniformly.
    None,
}

impl RecoveryStrategy<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Sealed { .. } => 0,
            Self::PasswordBackup { .. } => 1,
            Self::None => 2,
        }
    }

    fn attempt(
        &self,
        passwords: &PasswordVault,
        vault_id: &str,
    ) -> Option<(KeySource, Result<VaultKey>)> {
        match self {
            Self::Sealed {
                sealed_key,
                identity,
            } => Some((
                KeySource::Sealed,
                seal::unseal(sealed_key, vault_id, identity),
            )),
            Self::PasswordBackup { blob, password } => {
                let opened = passwords
                    .open_backup_text_bound(blob, password, &vault_key_context(vault_id))
                    .and_then(|secret| {
                        VaultKey::from_slice(&secret)
                            .map_err(|_| LegacyVaultError::WrongPasswordOrCorrupt)
                    });
                Some((KeySource::PasswordBackup, opened))
            }
            Self::None => None,
        }
    }
}

/// A vault key together with the path that produced it.
#[derive(Debug)]
pub struct Recovered {
    pub key: VaultKey,
    pub source: KeySource,
}

/// Walk the recovery paths for `vault_id`.
pub fn recover<S: KeyValueStore>(
    store: &KeyStore<S>,
    passwords: &PasswordVault,
    vault_id: &str,
    strategies: &[RecoveryStrategy<'_>],
) -> Result<Recovered> {
    if let Some(key) = store.get_intact(vault_id)? {
        debug!(vault_id, "vault key present locally");
        return Ok(Recovered {
            key,
            source: KeySource::Local,
        });
    }

    let mut ordered: Vec<&RecoveryStrategy<'_>> = strategies.iter().collect();
    ordered.sort_by_key(|s| s.rank());

    let mut first_failure: Option<LegacyVaultError> = None;

    for strategy in ordered {
        let Some((source, outcome)) = strategy.attempt(passwords, vault_id) else {
            continue;
        };

        match outcome {
            Ok(key) => {
                store.put(vault_id, &key)?;
                info!(vault_id, ?source, "vault key recovered");
                return Ok(Recovered { key, source });
            }
            Err(e) if e.is_cryptographic() => {
                warn!(vault_id, ?source, "recovery path failed, trying next");
                first_failure.get_or_insert(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(first_failure.unwrap_or_else(|| LegacyVaultError::KeyUnavailable(vault_id.to_string())))
}
