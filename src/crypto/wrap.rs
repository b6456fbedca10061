//! Content-key wrapping under the vault key (AES Key Wrap, RFC 3394).
//!
//! AES-KW is deterministic and needs no nonce. Its 8-byte integrity
//! check value makes any modification of the wrapped blob, or an
//! attempt to unwrap with a different vault key, fail outright instead
//! of yielding garbage key bytes.
//!
//! Layout of a wrapped content key: 40 bytes (32-byte key + 8-byte ICV).

use aes_kw::KekAes256;
use zeroize::Zeroize;

use super::keys::{ContentKey, VaultKey, KEY_LEN};
use crate::errors::{LegacyVaultError, Result};

/// Size of a wrapped 256-bit content key in bytes.
pub const WRAPPED_KEY_LEN: usize = KEY_LEN + 8;

fn kek(vault_key: &VaultKey) -> KekAes256 {
    let mut kek_bytes = *vault_key.as_bytes();
    let kek = KekAes256::from(kek_bytes);
    kek_bytes.zeroize();
    kek
}

/// Wrap `content_key` under `vault_key`.
pub fn wrap(content_key: &ContentKey, vault_key: &VaultKey) -> Result<Vec<u8>> {
    kek(vault_key)
        .wrap_vec(content_key.as_bytes())
        .map_err(|e| LegacyVaultError::EncryptionFailed(format!("key wrap failed: {e}")))
}

/// Unwrap a content key previously produced by [`wrap`].
///
/// Fails with `AuthenticationFailure` when the blob has the wrong
/// length, was modified, or was wrapped under a different vault key.
pub fn unwrap(wrapped: &[u8], vault_key: &VaultKey) -> Result<ContentKey> {
    if wrapped.len() != WRAPPED_KEY_LEN {
        return Err(LegacyVaultError::AuthenticationFailure);
    }

    let mut raw = kek(vault_key)
        .unwrap_vec(wrapped)
        .map_err(|_| LegacyVaultError::AuthenticationFailure)?;

    let key = ContentKey::from_slice(&raw);
    raw.zeroize();
    key
}
