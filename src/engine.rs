//! High-level entry points used by the surrounding application.
//!
//! `VaultCrypto` ties the key store to the primitives in `crypto` and
//! speaks only in text blobs, which is what the vault API, forms and
//! storage layers move around.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::backup::{vault_key_context, PasswordVault, IDENTITY_CONTEXT};
use crate::crypto::content::{self, EncryptedPayload, WrappedContentKey};
use crate::crypto::kdf::Argon2Params;
use crate::crypto::keys::VaultKey;
use crate::crypto::seal::{self, IdentityKeyPair, SealedKey};
use crate::errors::{LegacyVaultError, Result};
use crate::keystore::{KeyStore, KeyValueStore};
use crate::recovery::{self, Recovered, RecoveryStrategy};

/// The two text fields an uploaded file is stored with.
///
/// Both must be kept together; neither is useful alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFile {
    pub ciphertext: String,
    pub wrapped_key: String,
}

/// Envelope encryption and key distribution for one device.
pub struct VaultCrypto<S> {
    keys: KeyStore<S>,
    passwords: PasswordVault,
}

impl<S: KeyValueStore> VaultCrypto<S> {
    pub fn new(backend: S, params: Argon2Params) -> Result<Self> {
        Ok(Self {
            keys: KeyStore::new(backend),
            passwords: PasswordVault::new(params)?,
        })
    }

    pub fn keys(&self) -> &KeyStore<S> {
        &self.keys
    }

    pub fn passwords(&self) -> &PasswordVault {
        &self.passwords
    }

    fn local_key(&self, vault_id: &str) -> Result<VaultKey> {
        self.keys
            .get(vault_id)?
            .ok_or_else(|| LegacyVaultError::KeyUnavailable(vault_id.to_string()))
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Encrypt one file for `vault_id`, creating the vault key if this is
    /// the vault's first file on this device.
    pub fn encrypt_file(&self, vault_id: &str, plaintext: &[u8]) -> Result<EncryptedFile> {
        let vault_key = self.keys.ensure(vault_id)?;
        let (payload, wrapped) = content::encrypt(plaintext, &vault_key)?;
        debug!(vault_id, bytes = plaintext.len(), "encrypted file");

        Ok(EncryptedFile {
            ciphertext: payload.to_text(),
            wrapped_key: wrapped.to_text(),
        })
    }

    /// Decrypt a file of `vault_id` with the locally stored vault key.
    ///
    /// Fails with `KeyUnavailable` when the key has not been stored or
    /// recovered on this device yet; a key is never generated here.
    /// Any damage to either text field, including text that no longer
    /// decodes, is `AuthenticationFailure`.
    pub fn decrypt_file(&self, vault_id: &str, file: &EncryptedFile) -> Result<Vec<u8>> {
        let vault_key = self.local_key(vault_id)?;

        // Unwrap the content key before touching the payload.
        let wrapped = WrappedContentKey::from_text(&file.wrapped_key)
            .map_err(|_| LegacyVaultError::AuthenticationFailure)?;
        let content_key = content::unwrap_content_key(&wrapped, &vault_key)?;

        let payload = EncryptedPayload::from_text(&file.ciphertext)
            .map_err(|_| LegacyVaultError::AuthenticationFailure)?;
        content::decrypt_with_content_key(&payload, &content_key)
    }

    // ------------------------------------------------------------------
    // Password backups
    // ------------------------------------------------------------------

    pub fn create_backup(&self, secret: &[u8], password: &[u8]) -> Result<String> {
        self.passwords.seal_for_backup_text(secret, password)
    }

    pub fn open_backup(&self, blob: &str, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.passwords.open_backup_text(blob, password)
    }

    /// Password backup of the local vault key, for the owner to store
    /// server-side. The blob only opens for `vault_id`.
    pub fn backup_vault_key(&self, vault_id: &str, password: &[u8]) -> Result<String> {
        let vault_key = self.local_key(vault_id)?;
        let blob = self.passwords.seal_for_backup_text_bound(
            vault_key.as_bytes(),
            password,
            &vault_key_context(vault_id),
        )?;
        info!(vault_id, "created vault key backup");
        Ok(blob)
    }

    /// Open a backup made by [`backup_vault_key`](Self::backup_vault_key).
    ///
    /// The result is not cached; use [`VaultCrypto::recover`] for that.
    pub fn open_vault_key_backup(&self, vault_id: &str, blob: &str, password: &[u8]) -> Result<VaultKey> {
        let secret = self
            .passwords
            .open_backup_text_bound(blob, password, &vault_key_context(vault_id))?;
        VaultKey::from_slice(&secret).map_err(|_| LegacyVaultError::WrongPasswordOrCorrupt)
    }

    // ------------------------------------------------------------------
    // Participants
    // ------------------------------------------------------------------

    /// Seal the local vault key to a participant's public key (text form).
    pub fn seal_vault_key(&self, vault_id: &str, recipient_public: &str) -> Result<String> {
        let recipient = seal::public_key_from_text(recipient_public)?;
        let vault_key = self.local_key(vault_id)?;
        let sealed = seal::seal(&vault_key, vault_id, &recipient)?;
        info!(
            vault_id,
            recipient = %seal::fingerprint(&recipient),
            "sealed vault key"
        );
        Ok(sealed.to_text())
    }

    /// Open a sealed key of `vault_id` with the caller's own identity.
    ///
    /// The result is not cached; use [`VaultCrypto::recover`] for that.
    pub fn unseal(&self, vault_id: &str, sealed_key: &str, identity: &IdentityKeyPair) -> Result<VaultKey> {
        let sealed = SealedKey::from_text(sealed_key)?;
        seal::unseal(&sealed, vault_id, identity)
    }

    /// New identity keypair plus the password backup of its private half.
    pub fn create_identity(&self, password: &[u8]) -> Result<(IdentityKeyPair, String)> {
        let identity = IdentityKeyPair::generate();
        let secret = identity.secret_bytes();
        let blob = self
            .passwords
            .seal_for_backup_text_bound(&secret[..], password, IDENTITY_CONTEXT)?;
        info!(fingerprint = %identity.fingerprint(), "created identity keypair");
        Ok((identity, blob))
    }

    /// Open an identity backup with the login password and keep the
    /// keypair on this device for later unsealing.
    pub fn unlock_identity(&self, user_id: &str, blob: &str, password: &[u8]) -> Result<IdentityKeyPair> {
        let secret = self
            .passwords
            .open_backup_text_bound(blob, password, IDENTITY_CONTEXT)?;
        let identity = IdentityKeyPair::from_secret_slice(&secret)
            .map_err(|_| LegacyVaultError::WrongPasswordOrCorrupt)?;
        self.keys.put_identity(user_id, &identity)?;
        info!(user_id, "unlocked identity");
        Ok(identity)
    }

    /// The identity previously unlocked for `user_id` on this device.
    pub fn identity(&self, user_id: &str) -> Result<Option<IdentityKeyPair>> {
        self.keys.identity(user_id)
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    pub fn recover(&self, vault_id: &str, strategies: &[RecoveryStrategy<'_>]) -> Result<Recovered> {
        recovery::recover(&self.keys, &self.passwords, vault_id, strategies)
    }
}
