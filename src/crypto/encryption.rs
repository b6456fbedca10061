//! AES-256-GCM authenticated encryption.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! The `_with_aad` variants also authenticate caller-supplied associated
//! data that is not stored in the output; the same bytes must be passed
//! again to decrypt.

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{LegacyVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_aad(key, plaintext, &[])
}

/// Like [`encrypt`], binding `aad` into the authentication tag.
pub fn encrypt_with_aad(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    // Build the cipher from the raw key bytes.
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| LegacyVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    // Generate a random 12-byte nonce.
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    // Encrypt and authenticate the plaintext.
    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|e| LegacyVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    // Prepend the nonce so the caller only needs to store one blob.
    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt`.
///
/// Expects the first 12 bytes to be the nonce, followed by the ciphertext.
/// Every failure (short input, bad key, tag mismatch) is reported as
/// `AuthenticationFailure`.
pub fn decrypt(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    decrypt_with_aad(key, ciphertext_with_nonce, &[])
}

/// Decrypt data produced by [`encrypt_with_aad`] with the same `aad`.
pub fn decrypt_with_aad(key: &[u8], ciphertext_with_nonce: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    // Make sure we have at least a nonce and a tag worth of bytes.
    if ciphertext_with_nonce.len() < NONCE_LEN + TAG_LEN {
        return Err(LegacyVaultError::AuthenticationFailure);
    }

    // Split nonce from ciphertext.
    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    // Build the cipher from the raw key bytes.
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|_| LegacyVaultError::AuthenticationFailure)?;

    // Decrypt and verify the auth tag.
    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map_err(|_| LegacyVaultError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_carries_nonce_and_tag() {
        let out = encrypt(&[0x42; 32], b"abc").unwrap();
        assert_eq!(out.len(), NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = [0x01; 32];
        let out = encrypt(&key, b"").unwrap();
        assert!(decrypt(&key, &out).unwrap().is_empty());
    }

    #[test]
    fn rejects_short_key() {
        assert!(encrypt(&[0u8; 16], b"x").is_err());
    }

    #[test]
    fn truncated_input_is_authentication_failure() {
        let err = decrypt(&[0u8; 32], &[0u8; NONCE_LEN + TAG_LEN - 1]).unwrap_err();
        assert!(matches!(err, LegacyVaultError::AuthenticationFailure));
    }

    #[test]
    fn associated_data_must_match() {
        let key = [0x07; 32];
        let out = encrypt_with_aad(&key, b"secret", b"vault-a").unwrap();
        assert_eq!(decrypt_with_aad(&key, &out, b"vault-a").unwrap(), b"secret");

        let err = decrypt_with_aad(&key, &out, b"vault-b").unwrap_err();
        assert!(matches!(err, LegacyVaultError::AuthenticationFailure));
        assert!(decrypt(&key, &out).is_err());
    }
}
