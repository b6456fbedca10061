//! `legacyvault seal` — hand a vault key to a participant.

use crate::cli::output;
use crate::cli::{open_engine, write_blob, Cli};
use crate::crypto::seal::{fingerprint, public_key_from_text};
use crate::errors::Result;

/// Execute the `seal` command.
pub fn execute(cli: &Cli, vault: &str, recipient: &str, output_path: Option<&str>) -> Result<()> {
    let engine = open_engine(cli)?;
    let sealed = engine.seal_vault_key(vault, recipient)?;
    write_blob(output_path, &sealed)?;

    if let Some(path) = output_path {
        let recipient_fp = fingerprint(&public_key_from_text(recipient)?);
        output::success(&format!(
            "Sealed vault key '{vault}' for {recipient_fp} → {path}"
        ));
    }
    Ok(())
}
