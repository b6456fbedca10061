use thiserror::Error;

/// All errors that can occur in LegacyVault.
///
/// The first five variants are the ones callers are expected to branch
/// on. Cryptographic failures are never retried or downgraded inside the
/// crate; they reach the caller exactly as produced.
#[derive(Debug, Error)]
pub enum LegacyVaultError {
    // --- Key availability / crypto outcome ---
    #[error("No vault key available for vault '{0}' — recovery required")]
    KeyUnavailable(String),

    #[error("Cannot decrypt — data failed authentication (tampered, corrupted, or wrong key)")]
    AuthenticationFailure,

    #[error("Cannot open backup — wrong password or corrupted backup")]
    WrongPasswordOrCorrupt,

    #[error("Cannot unseal key — private key does not match or sealed key is invalid")]
    PrivateKeyMismatch,

    #[error("Key storage failed: {0}")]
    StorageFailure(String),

    // --- Blob / input errors ---
    #[error("Malformed blob: {0}")]
    MalformedBlob(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // --- Crypto plumbing ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl LegacyVaultError {
    /// `true` for failures that mean "the bytes or keys are wrong", as
    /// opposed to "no key yet" or "could not save".
    pub fn is_cryptographic(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailure | Self::WrongPasswordOrCorrupt | Self::PrivateKeyMismatch
        )
    }
}

/// Convenience type alias for LegacyVault results.
pub type Result<T> = std::result::Result<T, LegacyVaultError>;
