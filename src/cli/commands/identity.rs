//! `legacyvault identity` — create, unlock and show identity keypairs.

use crate::cli::output;
use crate::cli::{
    open_engine, prompt_new_password, prompt_password, read_blob, write_blob, Cli,
};
use crate::errors::Result;

/// Execute `identity new`.
///
/// The private half only leaves this command inside its password backup.
pub fn execute_new(cli: &Cli, output_path: Option<&str>) -> Result<()> {
    let engine = open_engine(cli)?;
    let password = prompt_new_password("Choose login password")?;
    let (identity, blob) = engine.create_identity(password.as_bytes())?;

    write_blob(output_path, &blob)?;
    if let Some(path) = output_path {
        output::success(&format!("Identity backup written to {path}"));
    }
    output::print_identity(None, &identity);
    output::tip("Publish the public key; keep the backup wherever login blobs are stored.");
    Ok(())
}

/// Execute `identity unlock`.
pub fn execute_unlock(cli: &Cli, user: &str, backup_path: &str) -> Result<()> {
    let engine = open_engine(cli)?;
    let blob = read_blob(backup_path)?;
    let password = prompt_password("Enter login password")?;

    let identity = engine.unlock_identity(user, &blob, password.as_bytes())?;
    output::success(&format!("Unlocked identity for '{user}'"));
    output::print_identity(Some(user), &identity);
    Ok(())
}

/// Execute `identity show`.
pub fn execute_show(cli: &Cli, user: &str) -> Result<()> {
    let engine = open_engine(cli)?;
    match engine.identity(user)? {
        Some(identity) => output::print_identity(Some(user), &identity),
        None => {
            output::info(&format!("No identity unlocked for '{user}' on this device."));
            output::tip("Run `legacyvault identity unlock --user <USER> <BACKUP>`.");
        }
    }
    Ok(())
}
