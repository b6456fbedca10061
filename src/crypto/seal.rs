//! Public-key sealing of vault keys for participants.
//!
//! Uses X25519 key exchange + XSalsa20-Poly1305. Each seal generates an
//! ephemeral keypair, so the sealed blob reveals nothing about who
//! produced it and two seals of the same key never match.
//!
//! The sealed plaintext is a digest of the vault id followed by the
//! vault key, so a seal only opens for the vault it was made for.
//!
//! Blob layout:
//!
//! ```text
//! [ ephemeral public key: 32 ][ nonce: 24 ][ ciphertext + tag: 80 ]
//! ```

use std::fmt;

use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use super::keys::{VaultKey, KEY_LEN};
use crate::codec;
use crate::errors::{LegacyVaultError, Result};

/// Size of an X25519 public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Size of the XSalsa20 nonce.
pub const SEAL_NONCE_LEN: usize = 24;

/// Poly1305 tag size.
const SEAL_TAG_LEN: usize = 16;

/// Size of the vault-id digest sealed alongside the key.
const BINDING_LEN: usize = 32;

/// Total size of a sealed vault key.
pub const SEALED_KEY_LEN: usize =
    PUBLIC_KEY_LEN + SEAL_NONCE_LEN + BINDING_LEN + KEY_LEN + SEAL_TAG_LEN;

fn vault_binding(vault_id: &str) -> [u8; BINDING_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(b"legacyvault-seal:");
    hasher.update(vault_id.as_bytes());
    let mut binding = [0u8; BINDING_LEN];
    binding.copy_from_slice(&hasher.finalize());
    binding
}

/// A user's X25519 identity keypair.
///
/// The secret half zeroizes itself on drop (from crypto_box).
pub struct IdentityKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl IdentityKeyPair {
    /// Generate a new random identity keypair.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let pair = Self::from_secret_bytes(bytes);
        bytes.zeroize();
        pair
    }

    /// Reconstruct a keypair from the raw 32-byte secret key.
    pub fn from_secret_bytes(bytes: [u8; KEY_LEN]) -> Self {
        let secret = SecretKey::from(bytes);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Reconstruct a keypair from a slice, e.g. an opened password backup.
    pub fn from_secret_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(LegacyVaultError::PrivateKeyMismatch);
        }
        let mut raw = [0u8; KEY_LEN];
        raw.copy_from_slice(bytes);
        let pair = Self::from_secret_bytes(raw);
        raw.zeroize();
        Ok(pair)
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// Raw secret key bytes, wiped when the returned value is dropped.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    /// Public key as base64 text, the form handed to the identity system.
    pub fn public_text(&self) -> String {
        public_key_to_text(&self.public)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public)
    }
}

impl fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityKeyPair")
            .field("public", &self.public_text())
            .finish_non_exhaustive()
    }
}

/// Encode a public key as base64 text.
pub fn public_key_to_text(public: &PublicKey) -> String {
    codec::encode(public.as_bytes())
}

/// Parse a base64 public key.
pub fn public_key_from_text(text: &str) -> Result<PublicKey> {
    let raw = codec::decode(text)?;
    let bytes: [u8; PUBLIC_KEY_LEN] = raw.as_slice().try_into().map_err(|_| {
        LegacyVaultError::MalformedBlob(format!(
            "public key must be {PUBLIC_KEY_LEN} bytes, got {}",
            raw.len()
        ))
    })?;
    Ok(PublicKey::from(bytes))
}

/// Short human-comparable fingerprint: first 8 bytes of SHA-256, hex.
pub fn fingerprint(public: &PublicKey) -> String {
    let digest = Sha256::digest(public.as_bytes());
    digest[..8]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// A vault key sealed to one participant's public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SealedKey(
    #[serde(
        serialize_with = "codec::base64_encode",
        deserialize_with = "codec::base64_decode"
    )]
    Vec<u8>,
);

impl SealedKey {
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

/// Seal `vault_key` of `vault_id` so only the holder of `recipient`'s
/// secret key can open it.
pub fn seal(vault_key: &VaultKey, vault_id: &str, recipient: &PublicKey) -> Result<SealedKey> {
    let ephemeral = IdentityKeyPair::generate();
    let salsa_box = SalsaBox::new(recipient, ephemeral.secret());

    let mut nonce_bytes = [0u8; SEAL_NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce_bytes);

    let mut plaintext = Zeroizing::new([0u8; BINDING_LEN + KEY_LEN]);
    plaintext[..BINDING_LEN].copy_from_slice(&vault_binding(vault_id));
    plaintext[BINDING_LEN..].copy_from_slice(vault_key.as_bytes());

    let ciphertext = salsa_box
        .encrypt(crypto_box::Nonce::from_slice(&nonce_bytes), &plaintext[..])
        .map_err(|e| LegacyVaultError::EncryptionFailed(format!("seal failed: {e}")))?;

    let mut blob = Vec::with_capacity(SEALED_KEY_LEN);
    blob.extend_from_slice(ephemeral.public().as_bytes());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(SealedKey(blob))
}

/// Open a sealed key of `vault_id` with the recipient's own identity.
///
/// Any failure (wrong identity, modified blob, wrong size, seal made for
/// another vault) is `PrivateKeyMismatch`; no partially-valid key bytes
/// are ever returned.
pub fn unseal(sealed: &SealedKey, vault_id: &str, identity: &IdentityKeyPair) -> Result<VaultKey> {
    if sealed.0.len() != SEALED_KEY_LEN {
        return Err(LegacyVaultError::PrivateKeyMismatch);
    }

    let (ephemeral_bytes, rest) = sealed.0.split_at(PUBLIC_KEY_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(SEAL_NONCE_LEN);

    let mut ephemeral = [0u8; PUBLIC_KEY_LEN];
    ephemeral.copy_from_slice(ephemeral_bytes);
    let salsa_box = SalsaBox::new(&PublicKey::from(ephemeral), identity.secret());

    let plaintext = Zeroizing::new(
        salsa_box
            .decrypt(crypto_box::Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| LegacyVaultError::PrivateKeyMismatch)?,
    );
    if plaintext.len() != BINDING_LEN + KEY_LEN {
        return Err(LegacyVaultError::PrivateKeyMismatch);
    }

    let (binding, key) = plaintext.split_at(BINDING_LEN);
    if !bool::from(binding.ct_eq(&vault_binding(vault_id))) {
        return Err(LegacyVaultError::PrivateKeyMismatch);
    }

    VaultKey::from_slice(key).map_err(|_| LegacyVaultError::PrivateKeyMismatch)
}
