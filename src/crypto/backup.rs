//! Password-protected backups of key material.
//!
//! Used for two secrets: the vault key (owner recovery) and a user's
//! private identity key (unlocked at login with the login password).
//!
//! Blob layout (base64 text when transported):
//!
//! ```text
//! [ version: 1 ][ memory KiB: u32 LE ][ iterations: u32 LE ][ lanes: u32 LE ]
//! [ salt: 32 bytes ][ nonce: 12 bytes ][ ciphertext + tag ]
//! ```
//!
//! The Argon2 parameters travel with the blob so a backup opens on any
//! device, whatever that device is configured to use for new backups.
//! The header and an optional context (e.g. the vault id) are bound in
//! as associated data.
//!
//! A fresh salt is drawn for every backup, so two backups of the same
//! secret under the same password share nothing.
//!
//! Opening never distinguishes a wrong password from a damaged blob;
//! both surface as `WrongPasswordOrCorrupt`.

use zeroize::{Zeroize, Zeroizing};

use super::encryption::{self, NONCE_LEN, TAG_LEN};
use super::kdf::{derive_key, generate_salt, Argon2Params, SALT_LEN};
use crate::codec;
use crate::errors::{LegacyVaultError, Result};

/// Current blob format version.
pub const BACKUP_VERSION: u8 = 1;

/// Version byte plus three little-endian u32 Argon2 parameters.
pub const HEADER_LEN: usize = 1 + 3 * 4;

/// Smallest well-formed backup: header + salt + nonce + tag (empty secret).
const MIN_BLOB_LEN: usize = HEADER_LEN + SALT_LEN + NONCE_LEN + TAG_LEN;

/// Upper bounds on parameters read from a blob, so a crafted backup
/// cannot make the opening device allocate or spin without limit.
const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;
const MAX_ITERATIONS: u32 = 64;
const MAX_PARALLELISM: u32 = 64;

/// Context of an identity-key backup.
pub const IDENTITY_CONTEXT: &[u8] = b"identity";

/// Context of a vault-key backup; ties the blob to one vault.
pub fn vault_key_context(vault_id: &str) -> Vec<u8> {
    format!("vault-key:{vault_id}").into_bytes()
}

fn encode_header(params: &Argon2Params) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = BACKUP_VERSION;
    header[1..5].copy_from_slice(&params.memory_kib.to_le_bytes());
    header[5..9].copy_from_slice(&params.iterations.to_le_bytes());
    header[9..13].copy_from_slice(&params.parallelism.to_le_bytes());
    header
}

fn decode_header(header: &[u8]) -> Result<Argon2Params> {
    let field = |at: usize| {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&header[at..at + 4]);
        u32::from_le_bytes(raw)
    };

    if header.len() != HEADER_LEN || header[0] != BACKUP_VERSION {
        return Err(LegacyVaultError::WrongPasswordOrCorrupt);
    }

    let params = Argon2Params {
        memory_kib: field(1),
        iterations: field(5),
        parallelism: field(9),
    };
    if params.memory_kib > MAX_MEMORY_KIB
        || params.iterations > MAX_ITERATIONS
        || params.parallelism > MAX_PARALLELISM
    {
        return Err(LegacyVaultError::WrongPasswordOrCorrupt);
    }
    params
        .validate()
        .map_err(|_| LegacyVaultError::WrongPasswordOrCorrupt)?;
    Ok(params)
}

/// Seals password backups with a configured set of KDF parameters and
/// opens backups made under any valid parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordVault {
    params: Argon2Params,
}

impl PasswordVault {
    pub fn new(params: Argon2Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters used for new backups.
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    /// Derive a 256-bit key from `password` and `salt` with the configured parameters.
    pub fn derive(&self, password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
        derive_key(password, salt, &self.params).map(Zeroizing::new)
    }

    /// Encrypt `secret` under a key derived from `password`.
    pub fn seal_for_backup(&self, secret: &[u8], password: &[u8]) -> Result<Vec<u8>> {
        self.seal_for_backup_bound(secret, password, &[])
    }

    /// Like [`seal_for_backup`](Self::seal_for_backup); the blob only
    /// opens when the same `context` is supplied.
    pub fn seal_for_backup_bound(
        &self,
        secret: &[u8],
        password: &[u8],
        context: &[u8],
    ) -> Result<Vec<u8>> {
        let header = encode_header(&self.params);
        let salt = generate_salt();
        let key = self.derive(password, &salt)?;

        let aad = [&header[..], context].concat();
        let sealed = encryption::encrypt_with_aad(&key[..], secret, &aad)?;

        let mut blob = Vec::with_capacity(HEADER_LEN + SALT_LEN + sealed.len());
        blob.extend_from_slice(&header);
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    /// Reverse [`seal_for_backup`](Self::seal_for_backup).
    pub fn open_backup(&self, blob: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.open_backup_bound(blob, password, &[])
    }

    /// Reverse [`seal_for_backup_bound`](Self::seal_for_backup_bound).
    ///
    /// Derives with the parameters stored in the blob, not the configured ones.
    pub fn open_backup_bound(
        &self,
        blob: &[u8],
        password: &[u8],
        context: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        if blob.len() < MIN_BLOB_LEN {
            return Err(LegacyVaultError::WrongPasswordOrCorrupt);
        }

        let (header, rest) = blob.split_at(HEADER_LEN);
        let params = decode_header(header)?;
        let (salt, sealed) = rest.split_at(SALT_LEN);
        let key = Zeroizing::new(
            derive_key(password, salt, &params)
                .map_err(|_| LegacyVaultError::WrongPasswordOrCorrupt)?,
        );

        let aad = [header, context].concat();
        encryption::decrypt_with_aad(&key[..], sealed, &aad)
            .map(Zeroizing::new)
            .map_err(|_| LegacyVaultError::WrongPasswordOrCorrupt)
    }

    /// Text-blob convenience around [`seal_for_backup`](Self::seal_for_backup).
    pub fn seal_for_backup_text(&self, secret: &[u8], password: &[u8]) -> Result<String> {
        self.seal_for_backup_text_bound(secret, password, &[])
    }

    pub fn seal_for_backup_text_bound(
        &self,
        secret: &[u8],
        password: &[u8],
        context: &[u8],
    ) -> Result<String> {
        let mut blob = self.seal_for_backup_bound(secret, password, context)?;
        let text = codec::encode(&blob);
        blob.zeroize();
        Ok(text)
    }

    /// Text-blob convenience around [`open_backup`](Self::open_backup).
    ///
    /// Unparseable text is reported as `WrongPasswordOrCorrupt` too.
    pub fn open_backup_text(&self, blob: &str, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.open_backup_text_bound(blob, password, &[])
    }

    pub fn open_backup_text_bound(
        &self,
        blob: &str,
        password: &[u8],
        context: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let raw = codec::decode(blob).map_err(|_| LegacyVaultError::WrongPasswordOrCorrupt)?;
        self.open_backup_bound(&raw, password, context)
    }
}
