//! `legacyvault decrypt` — decrypt a record produced by `encrypt`.

use std::io::Write;

use crate::cli::output;
use crate::cli::{open_engine, Cli};
use crate::engine::EncryptedFile;
use crate::errors::{LegacyVaultError, Result};

/// Execute the `decrypt` command.
pub fn execute(cli: &Cli, vault: &str, input: &str, output_path: Option<&str>) -> Result<()> {
    let engine = open_engine(cli)?;

    let contents = std::fs::read_to_string(input)
        .map_err(|e| LegacyVaultError::CommandFailed(format!("cannot read {input}: {e}")))?;
    let record: EncryptedFile = serde_json::from_str(&contents)
        .map_err(|e| LegacyVaultError::SerializationError(format!("{input}: {e}")))?;

    let plaintext = match engine.decrypt_file(vault, &record) {
        Ok(bytes) => bytes,
        Err(e @ LegacyVaultError::KeyUnavailable(_)) => {
            output::tip(&format!(
                "Run `legacyvault recover --vault {vault}` with a sealed key or password backup."
            ));
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    match output_path {
        Some(path) => {
            std::fs::write(path, &plaintext)
                .map_err(|e| LegacyVaultError::CommandFailed(format!("cannot write {path}: {e}")))?;
            output::success(&format!("Decrypted {input} → {path}"));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
