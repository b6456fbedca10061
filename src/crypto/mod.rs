//! Cryptographic primitives for LegacyVault.
//!
//! This module provides:
//! - Zeroizing vault / content key types (`keys`)
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - AES Key Wrap of content keys under the vault key (`wrap`)
//! - Per-file envelope encryption (`content`)
//! - Argon2id password-based key derivation (`kdf`)
//! - Password-protected backups of key material (`backup`)
//! - X25519 sealing of vault keys to participants (`seal`)

pub mod backup;
pub mod content;
pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod seal;
pub mod wrap;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{VaultKey, PasswordVault, seal, unseal, ...};
pub use backup::PasswordVault;
pub use content::{EncryptedPayload, WrappedContentKey};
pub use kdf::{derive_key, generate_salt, Argon2Params};
pub use keys::{ContentKey, VaultKey, KEY_LEN};
pub use seal::{seal, unseal, IdentityKeyPair, SealedKey};
