//! `legacyvault recover` — walk the recovery paths for a vault key.

use crate::cli::output;
use crate::cli::{open_engine, prompt_password, read_blob, Cli};
use crate::crypto::seal::{IdentityKeyPair, SealedKey};
use crate::errors::{LegacyVaultError, Result};
use crate::recovery::{KeySource, RecoveryStrategy};

/// Execute the `recover` command.
///
/// Only the paths whose inputs were given are offered; the password is
/// asked for only when a backup was supplied.
pub fn execute(
    cli: &Cli,
    vault: &str,
    sealed_path: Option<&str>,
    user: Option<&str>,
    backup_path: Option<&str>,
) -> Result<()> {
    let engine = open_engine(cli)?;

    let sealed: Option<(SealedKey, IdentityKeyPair)> = match (sealed_path, user) {
        (Some(path), Some(user)) => {
            let sealed = SealedKey::from_text(&read_blob(path)?)?;
            let identity = engine.identity(user)?.ok_or_else(|| {
                LegacyVaultError::CommandFailed(format!(
                    "no identity unlocked for '{user}' — run `legacyvault identity unlock` first"
                ))
            })?;
            Some((sealed, identity))
        }
        _ => None,
    };

    let backup = match backup_path {
        Some(path) => Some((read_blob(path)?, prompt_password("Enter backup password")?)),
        None => None,
    };

    let mut strategies = Vec::new();
    if let Some((sealed_key, identity)) = &sealed {
        strategies.push(RecoveryStrategy::Sealed {
            sealed_key,
            identity,
        });
    }
    if let Some((blob, password)) = &backup {
        strategies.push(RecoveryStrategy::PasswordBackup {
            blob: blob.as_str(),
            password: password.as_bytes(),
        });
    }
    if strategies.is_empty() {
        strategies.push(RecoveryStrategy::None);
    }

    match engine.recover(vault, &strategies) {
        Ok(recovered) => {
            let how = match recovered.source {
                KeySource::Local => "already on this device",
                KeySource::Sealed => "unsealed with your identity",
                KeySource::PasswordBackup => "restored from password backup",
            };
            output::success(&format!("Vault key for '{vault}' {how}"));
            Ok(())
        }
        Err(e @ LegacyVaultError::KeyUnavailable(_)) => {
            output::warning(&format!("Vault '{vault}' stays locked for now."));
            output::tip("Supply --sealed with --user, or --backup, once one is available.");
            Err(e)
        }
        Err(e) => Err(e),
    }
}
