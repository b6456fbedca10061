//! `legacyvault unseal` — open a sealed key and store the vault key locally.

use crate::cli::output;
use crate::cli::{open_engine, read_blob, Cli};
use crate::errors::{LegacyVaultError, Result};

/// Execute the `unseal` command.
pub fn execute(cli: &Cli, vault: &str, user: &str, sealed_path: &str) -> Result<()> {
    let engine = open_engine(cli)?;
    let identity = engine.identity(user)?.ok_or_else(|| {
        LegacyVaultError::CommandFailed(format!(
            "no identity unlocked for '{user}' — run `legacyvault identity unlock` first"
        ))
    })?;

    let sealed = read_blob(sealed_path)?;
    let vault_key = engine.unseal(vault, &sealed, &identity)?;
    engine.keys().put(vault, &vault_key)?;

    output::success(&format!("Unsealed and stored vault key for '{vault}'"));
    Ok(())
}
