use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{LegacyVaultError, Result};

/// Where the local key store lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyBackend {
    /// One file per entry under `key_dir`.
    #[default]
    File,
    /// The OS credential store (needs the `keyring-store` feature).
    Keyring,
}

/// Project-level configuration, loaded from `.legacyvault.toml`.
///
/// Every field has a default, so no config file is needed at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to the project root) holding the local key store.
    #[serde(default = "default_key_dir")]
    pub key_dir: String,

    /// Key store backend (default: file).
    #[serde(default)]
    pub key_backend: KeyBackend,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_key_dir() -> String {
    ".legacyvault/keys".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_dir: default_key_dir(),
            key_backend: KeyBackend::default(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".legacyvault.toml";

    /// Load settings from `<project_dir>/.legacyvault.toml`.
    ///
    /// A missing file yields the defaults; an unparsable one is an error.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            LegacyVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Absolute location of the key store for a project.
    ///
    /// An absolute `key_dir` is used as-is.
    pub fn key_dir_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.key_dir)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.key_dir, ".legacyvault/keys");
        assert_eq!(s.key_backend, KeyBackend::File);
        assert_eq!(s.argon2_params(), Argon2Params::default());
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.key_dir, ".legacyvault/keys");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
key_dir = "keys"
key_backend = "keyring"
argon2_memory_kib = 131072
argon2_iterations = 5
argon2_parallelism = 8
"#;
        fs::write(tmp.path().join(".legacyvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.key_dir, "keys");
        assert_eq!(settings.key_backend, KeyBackend::Keyring);
        assert_eq!(settings.argon2_memory_kib, 131_072);
        assert_eq!(settings.argon2_iterations, 5);
        assert_eq!(settings.argon2_parallelism, 8);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".legacyvault.toml"), "argon2_iterations = 4\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.argon2_iterations, 4);
        assert_eq!(settings.key_dir, ".legacyvault/keys");
        assert_eq!(settings.argon2_memory_kib, 65_536);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".legacyvault.toml"), "not valid {{toml").unwrap();

        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(matches!(err, LegacyVaultError::ConfigError(_)));
    }

    #[test]
    fn load_rejects_unknown_backend() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".legacyvault.toml"), "key_backend = \"cloud\"\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn key_dir_path_is_relative_to_project() {
        let s = Settings::default();
        assert_eq!(
            s.key_dir_path(Path::new("/home/user/estate")),
            PathBuf::from("/home/user/estate/.legacyvault/keys")
        );
    }

    #[test]
    fn absolute_key_dir_is_kept() {
        let s = Settings {
            key_dir: "/var/lib/legacyvault".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            s.key_dir_path(Path::new("/home/user/estate")),
            PathBuf::from("/var/lib/legacyvault")
        );
    }
}
