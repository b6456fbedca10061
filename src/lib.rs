pub mod cli;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod errors;
pub mod keystore;
pub mod recovery;

#[cfg(feature = "keyring-store")]
pub mod keyring;

pub use engine::{EncryptedFile, VaultCrypto};
pub use errors::{LegacyVaultError, Result};
pub use recovery::{KeySource, Recovered, RecoveryStrategy};
