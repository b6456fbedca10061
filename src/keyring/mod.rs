//! OS keyring backend for the key store.
//!
//! Keeps each key-store entry in the operating system's secure
//! credential store instead of a directory:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! The keyring cannot enumerate entries, so `names` is unsupported and
//! `put_if_absent` uses the read-then-write default (the per-vault lock
//! in `KeyStore` still serializes callers within one process).

use crate::errors::{LegacyVaultError, Result};
use crate::keystore::KeyValueStore;

/// Service name used in the OS keyring.
const SERVICE_NAME: &str = "legacyvault";

/// Key-value store backed by the OS keyring.
#[derive(Debug, Default, Clone)]
pub struct KeyringStore {
    /// Namespaces entries, e.g. per profile or per server.
    namespace: String,
}

impl KeyringStore {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(SERVICE_NAME, &format!("{}:{name}", self.namespace)).map_err(|e| {
            LegacyVaultError::StorageFailure(format!("failed to create keyring entry: {e}"))
        })
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        match self.entry(name)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(LegacyVaultError::StorageFailure(format!(
                "failed to read from keyring: {e}"
            ))),
        }
    }

    fn put(&self, name: &str, value: &str) -> Result<()> {
        self.entry(name)?.set_password(value).map_err(|e| {
            LegacyVaultError::StorageFailure(format!("failed to store key in keyring: {e}"))
        })
    }

    fn remove(&self, name: &str) -> Result<bool> {
        match self.entry(name)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(LegacyVaultError::StorageFailure(format!(
                "failed to delete from keyring: {e}"
            ))),
        }
    }

    fn names(&self) -> Result<Vec<String>> {
        Err(LegacyVaultError::StorageFailure(
            "the OS keyring cannot list stored entries".into(),
        ))
    }
}
