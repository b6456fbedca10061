//! Per-file envelope encryption.
//!
//! Every call to [`encrypt`] draws a brand-new `ContentKey`, seals the
//! file bytes with it under AES-256-GCM, then wraps the content key
//! under the vault key. The two halves travel as separate blobs:
//!
//! ```text
//! EncryptedPayload   = nonce(12) || ciphertext || tag(16)
//! WrappedContentKey  = AES-KW(vault_key, content_key)   (40 bytes)
//! ```
//!
//! [`decrypt`] unwraps the content key first, so a bad wrapped key or a
//! wrong vault key is rejected before the payload is touched.

use serde::{Deserialize, Serialize};

use super::encryption::{self, NONCE_LEN, TAG_LEN};
use super::keys::{ContentKey, VaultKey};
use super::wrap;
use crate::codec;
use crate::errors::{LegacyVaultError, Result};

/// Nonce plus authenticated ciphertext of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedPayload(
    #[serde(
        serialize_with = "codec::base64_encode",
        deserialize_with = "codec::base64_decode"
    )]
    Vec<u8>,
);

impl EncryptedPayload {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The random nonce this payload was sealed with.
    pub fn nonce(&self) -> &[u8] {
        &self.0[..NONCE_LEN.min(self.0.len())]
    }

    pub fn to_text(&self) -> String {
        codec::encode(&self.0)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        codec::decode(text).map(Self)
    }
}

/// A content key wrapped under a vault key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrappedContentKey(
    #[serde(
        serialize_with = "codec::base64_encode",
        deserialize_with = "codec::base64_decode"
    )]
    Vec<u8>,
);

impl WrappedContentKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_text(&self) -> String {
        codec::encode(&self.0)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        codec::decode(text).map(Self)
    }
}

/// Encrypt one file's bytes for a vault.
pub fn encrypt(plaintext: &[u8], vault_key: &VaultKey) -> Result<(EncryptedPayload, WrappedContentKey)> {
    let content_key = ContentKey::generate();
    let sealed = encryption::encrypt(content_key.as_bytes(), plaintext)?;
    let wrapped = wrap::wrap(&content_key, vault_key)?;
    Ok((EncryptedPayload(sealed), WrappedContentKey(wrapped)))
}

/// Decrypt a payload produced by [`encrypt`].
///
/// Returns `AuthenticationFailure` for a tampered payload, a tampered
/// wrapped key, or a vault key other than the one used at encryption.
pub fn decrypt(
    payload: &EncryptedPayload,
    wrapped_key: &WrappedContentKey,
    vault_key: &VaultKey,
) -> Result<Vec<u8>> {
    let content_key = wrap::unwrap(wrapped_key.as_bytes(), vault_key)?;
    decrypt_with_content_key(payload, &content_key)
}

/// Decrypt a payload with an already unwrapped content key.
pub fn decrypt_with_content_key(payload: &EncryptedPayload, content_key: &ContentKey) -> Result<Vec<u8>> {
    if payload.0.len() < NONCE_LEN + TAG_LEN {
        return Err(LegacyVaultError::AuthenticationFailure);
    }

    encryption::decrypt(content_key.as_bytes(), &payload.0)
}

/// Recover the content key from its wrapped form.
pub fn unwrap_content_key(wrapped_key: &WrappedContentKey, vault_key: &VaultKey) -> Result<ContentKey> {
    wrap::unwrap(wrapped_key.as_bytes(), vault_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world_roundtrip() {
        let vault_key = VaultKey::generate();
        let (payload, wrapped) = encrypt(b"hello world", &vault_key).unwrap();

        assert_eq!(payload.as_bytes().len(), NONCE_LEN + 11 + TAG_LEN);
        assert_eq!(decrypt(&payload, &wrapped, &vault_key).unwrap(), b"hello world");
    }

    #[test]
    fn same_plaintext_gets_fresh_key_and_nonce() {
        let vault_key = VaultKey::generate();
        let (p1, w1) = encrypt(b"same bytes", &vault_key).unwrap();
        let (p2, w2) = encrypt(b"same bytes", &vault_key).unwrap();

        assert_ne!(p1, p2);
        assert_ne!(p1.nonce(), p2.nonce());
        assert_ne!(w1, w2);

        let k1 = unwrap_content_key(&w1, &vault_key).unwrap();
        let k2 = unwrap_content_key(&w2, &vault_key).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn bad_wrapped_key_fails_before_payload_is_inspected() {
        let vault_key = VaultKey::generate();
        let (_, wrapped) = encrypt(b"data", &vault_key).unwrap();
        let mut bad = wrapped.as_bytes().to_vec();
        bad[0] ^= 0x01;

        // An empty payload would also fail, but the wrapped key is checked first.
        let err = decrypt(
            &EncryptedPayload::from_bytes(Vec::new()),
            &WrappedContentKey::from_bytes(bad),
            &vault_key,
        )
        .unwrap_err();
        assert!(matches!(err, LegacyVaultError::AuthenticationFailure));
    }

    #[test]
    fn swapped_wrapped_keys_are_rejected() {
        let vault_key = VaultKey::generate();
        let (p1, _) = encrypt(b"first file", &vault_key).unwrap();
        let (_, w2) = encrypt(b"second file", &vault_key).unwrap();

        let err = decrypt(&p1, &w2, &vault_key).unwrap_err();
        assert!(matches!(err, LegacyVaultError::AuthenticationFailure));
    }
}
