//! `legacyvault key` — inspect, back up, restore and forget vault keys.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{
    key_location, open_engine, prompt_new_password, prompt_password, read_blob, write_blob, Cli,
};
use crate::errors::{LegacyVaultError, Result};
use crate::recovery::{KeySource, RecoveryStrategy};

/// Execute `key status`.
pub fn execute_status(cli: &Cli, vault: &str) -> Result<()> {
    let engine = open_engine(cli)?;

    if engine.keys().get(vault)?.is_some() {
        output::success(&format!("Vault key for '{vault}' is available on this device."));
    } else {
        output::warning(&format!("No vault key for '{vault}' on this device."));
        output::tip("Recover it with `legacyvault recover` or `legacyvault key restore`.");
    }

    Ok(())
}

/// Execute `key list`.
pub fn execute_list(cli: &Cli) -> Result<()> {
    let engine = open_engine(cli)?;
    let ids = engine.keys().vault_ids()?;
    output::print_vault_keys_table(&ids, &key_location(cli)?);
    Ok(())
}

/// Execute `key backup`.
pub fn execute_backup(cli: &Cli, vault: &str, output_path: Option<&str>) -> Result<()> {
    let engine = open_engine(cli)?;
    // Fail before prompting when there is nothing to back up.
    if engine.keys().get(vault)?.is_none() {
        return Err(LegacyVaultError::KeyUnavailable(vault.to_string()));
    }

    let password = prompt_new_password("Choose backup password")?;
    let blob = engine.backup_vault_key(vault, password.as_bytes())?;
    write_blob(output_path, &blob)?;

    if let Some(path) = output_path {
        output::success(&format!("Backup of vault key '{vault}' written to {path}"));
    }
    Ok(())
}

/// Execute `key restore`.
pub fn execute_restore(cli: &Cli, vault: &str, backup_path: &str) -> Result<()> {
    let engine = open_engine(cli)?;
    let blob = read_blob(backup_path)?;
    let password = prompt_password("Enter backup password")?;

    let recovered = engine.recover(
        vault,
        &[RecoveryStrategy::PasswordBackup {
            blob: &blob,
            password: password.as_bytes(),
        }],
    )?;

    match recovered.source {
        KeySource::Local => output::info(&format!(
            "Vault key for '{vault}' is already on this device; backup not needed."
        )),
        _ => output::success(&format!("Restored vault key for '{vault}'")),
    }
    Ok(())
}

/// Execute `key forget`.
pub fn execute_forget(cli: &Cli, vault: &str, force: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Forget the local key for vault '{vault}'? Files stay locked until it is recovered."
            ))
            .default(false)
            .interact()
            .map_err(|e| LegacyVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let engine = open_engine(cli)?;
    if engine.keys().forget(vault)? {
        output::success(&format!("Forgot local key for vault '{vault}'"));
    } else {
        output::info(&format!("No local key stored for vault '{vault}'"));
    }
    Ok(())
}
