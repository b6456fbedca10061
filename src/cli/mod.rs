//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::{KeyBackend, Settings};
use crate::engine::VaultCrypto;
use crate::errors::{LegacyVaultError, Result};
use crate::keystore::{FileStore, KeyValueStore};

/// Engine over whichever key store backend the project is configured for.
pub type Engine = VaultCrypto<Box<dyn KeyValueStore>>;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable read before prompting for a password.
const PASSWORD_ENV: &str = "LEGACYVAULT_PASSWORD";

/// LegacyVault CLI: client-side encryption and key hand-off for a digital legacy vault.
#[derive(Parser)]
#[command(
    name = "legacyvault",
    about = "Client-side encryption and key distribution for a digital legacy vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Local key directory (default: `key_dir` from .legacyvault.toml)
    #[arg(long, global = true)]
    pub key_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Encrypt a file for a vault (creates the vault key on first use)
    Encrypt {
        /// Vault identifier
        #[arg(short, long)]
        vault: String,
        /// File to encrypt
        input: String,
        /// Where to write the encrypted record (default: <input>.lv.json)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Decrypt an encrypted record produced by `encrypt`
    Decrypt {
        /// Vault identifier
        #[arg(short, long)]
        vault: String,
        /// Encrypted record (JSON)
        input: String,
        /// Where to write the plaintext (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage locally stored vault keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Manage identity keypairs used for sealing
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },

    /// Seal a vault key to a participant's public key
    Seal {
        /// Vault identifier
        #[arg(short, long)]
        vault: String,
        /// Recipient public key (base64)
        recipient: String,
        /// Where to write the sealed key (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Open a sealed key with an unlocked identity and store the vault key
    Unseal {
        /// Vault identifier
        #[arg(short, long)]
        vault: String,
        /// User whose unlocked identity opens the sealed key
        #[arg(short, long)]
        user: String,
        /// File holding the sealed key
        sealed: String,
    },

    /// Obtain a vault key through whichever recovery path works
    Recover {
        /// Vault identifier
        #[arg(short, long)]
        vault: String,
        /// File holding a sealed key for `--user`
        #[arg(long, requires = "user")]
        sealed: Option<String>,
        /// User whose unlocked identity opens the sealed key
        #[arg(short, long)]
        user: Option<String>,
        /// File holding the owner's password backup
        #[arg(long)]
        backup: Option<String>,
    },

    /// Show version
    Version,
}

/// Key subcommands.
#[derive(clap::Subcommand)]
pub enum KeyAction {
    /// Report whether a vault key is available on this device
    Status {
        /// Vault identifier
        vault: String,
    },

    /// List vaults with a locally stored key
    List,

    /// Write a password backup of a vault key
    Backup {
        /// Vault identifier
        vault: String,
        /// Where to write the backup (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Restore a vault key from a password backup
    Restore {
        /// Vault identifier
        vault: String,
        /// File holding the backup
        backup: String,
    },

    /// Remove the local copy of a vault key
    Forget {
        /// Vault identifier
        vault: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Identity subcommands.
#[derive(clap::Subcommand)]
pub enum IdentityAction {
    /// Generate a keypair and a password backup of its private half
    New {
        /// Where to write the private-key backup (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Open an identity backup and keep the keypair on this device
    Unlock {
        /// User identifier
        #[arg(short, long)]
        user: String,
        /// File holding the identity backup
        backup: String,
    },

    /// Show the public key of an unlocked identity
    Show {
        /// User identifier
        #[arg(short, long)]
        user: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get an existing password, trying in order:
/// 1. `LEGACYVAULT_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| LegacyVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used when creating backups).
///
/// Also respects `LEGACYVAULT_PASSWORD`. Enforces a minimum length.
pub fn prompt_new_password(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            check_password_len(&pw)?;
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(prompt)
                .with_confirmation("Confirm password", "Passwords do not match, try again")
                .interact()
                .map_err(|e| LegacyVaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if check_password_len(&password).is_err() {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

fn check_password_len(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LegacyVaultError::CommandFailed(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Resolve the key directory: `--key-dir` wins over the config file.
pub fn key_dir(cli: &Cli, settings: &Settings, project_dir: &Path) -> PathBuf {
    match &cli.key_dir {
        Some(dir) => project_dir.join(dir),
        None => settings.key_dir_path(project_dir),
    }
}

/// Build the engine for the current directory from CLI args and settings.
pub fn open_engine(cli: &Cli) -> Result<Engine> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let backend = open_backend(cli, &settings, &cwd)?;
    VaultCrypto::new(backend, settings.argon2_params())
}

fn open_backend(cli: &Cli, settings: &Settings, project_dir: &Path) -> Result<Box<dyn KeyValueStore>> {
    match settings.key_backend {
        KeyBackend::File => Ok(Box::new(FileStore::open(&key_dir(cli, settings, project_dir))?)),
        #[cfg(feature = "keyring-store")]
        KeyBackend::Keyring => Ok(Box::new(crate::keyring::KeyringStore::new(
            &project_dir.to_string_lossy(),
        ))),
        #[cfg(not(feature = "keyring-store"))]
        KeyBackend::Keyring => Err(LegacyVaultError::ConfigError(
            "key_backend = \"keyring\" requires building with the keyring-store feature".into(),
        )),
    }
}

/// Human-readable location of the configured key store.
pub fn key_location(cli: &Cli) -> Result<String> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    Ok(match settings.key_backend {
        KeyBackend::File => key_dir(cli, &settings, &cwd).display().to_string(),
        KeyBackend::Keyring => "OS keyring".to_string(),
    })
}

/// Read a text blob (backup, sealed key) from a file.
pub fn read_blob(path: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| LegacyVaultError::CommandFailed(format!("cannot read {path}: {e}")))
}

/// Write a text blob to `output`, or print it to stdout when `None`.
pub fn write_blob(output: Option<&str>, blob: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{blob}\n"))
            .map_err(|e| LegacyVaultError::CommandFailed(format!("cannot write {path}: {e}"))),
        None => {
            println!("{blob}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn password_length_is_enforced() {
        assert!(check_password_len("short").is_err());
        assert!(check_password_len("long enough").is_ok());
    }

    #[test]
    fn key_dir_flag_overrides_settings() {
        let project = Path::new("/srv/estate");
        let settings = Settings::default();

        let with_flag = cli(&["legacyvault", "--key-dir", "keys", "key", "list"]);
        assert_eq!(
            key_dir(&with_flag, &settings, project),
            PathBuf::from("/srv/estate/keys")
        );

        let without = cli(&["legacyvault", "key", "list"]);
        assert_eq!(
            key_dir(&without, &settings, project),
            PathBuf::from("/srv/estate/.legacyvault/keys")
        );
    }

    #[test]
    fn recover_sealed_requires_user() {
        assert!(
            Cli::try_parse_from(["legacyvault", "recover", "-v", "v1", "--sealed", "s.txt"]).is_err()
        );
        assert!(Cli::try_parse_from([
            "legacyvault", "recover", "-v", "v1", "--sealed", "s.txt", "--user", "bob"
        ])
        .is_ok());
    }
}
