//! `legacyvault encrypt` — envelope-encrypt a file for a vault.

use crate::cli::output;
use crate::cli::{open_engine, Cli};
use crate::errors::{LegacyVaultError, Result};

/// Execute the `encrypt` command.
pub fn execute(cli: &Cli, vault: &str, input: &str, output_path: Option<&str>) -> Result<()> {
    let engine = open_engine(cli)?;
    let first_file = engine.keys().get(vault)?.is_none();

    let plaintext = std::fs::read(input)
        .map_err(|e| LegacyVaultError::CommandFailed(format!("cannot read {input}: {e}")))?;
    let record = engine.encrypt_file(vault, &plaintext)?;

    let json = serde_json::to_string_pretty(&record)
        .map_err(|e| LegacyVaultError::SerializationError(e.to_string()))?;

    let target = output_path
        .map(str::to_string)
        .unwrap_or_else(|| format!("{input}.lv.json"));
    std::fs::write(&target, json)
        .map_err(|e| LegacyVaultError::CommandFailed(format!("cannot write {target}: {e}")))?;

    output::success(&format!(
        "Encrypted {input} ({} bytes) for vault '{vault}' → {target}",
        plaintext.len()
    ));
    if first_file {
        output::tip(&format!(
            "A new vault key was created. Run `legacyvault key backup {vault}` so it can be recovered."
        ));
    }

    Ok(())
}
