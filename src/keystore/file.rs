//! Directory-backed key store: one small text file per entry.
//!
//! ```text
//! <key_dir>/vault-key.<vault_id>.key
//! <key_dir>/identity.<user_id>.key
//! ```
//!
//! Writes go to a temp file in the same directory first, then are
//! renamed (replace) or hard-linked (create-if-absent) into place, so a
//! reader never observes a half-written key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::backend::KeyValueStore;
use crate::errors::{LegacyVaultError, Result};

/// File extension for stored entries.
const ENTRY_EXT: &str = ".key";

fn storage_err(action: &str, path: &Path, e: std::io::Error) -> LegacyVaultError {
    LegacyVaultError::StorageFailure(format!("{action} {}: {e}", path.display()))
}

/// Key-value store rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a key directory.
    ///
    /// On Unix the directory is restricted to the owner.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| storage_err("cannot create", dir, e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
                    .map_err(|e| storage_err("cannot restrict", dir, e))?;
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{ENTRY_EXT}"))
    }

    /// Write `value` to a fresh temp file next to the target.
    fn write_temp(&self, name: &str, value: &str) -> Result<PathBuf> {
        let tmp_path = self
            .dir
            .join(format!(".{name}.{:016x}.tmp", rand::random::<u64>()));

        fs::write(&tmp_path, value.as_bytes()).map_err(|e| storage_err("cannot write", &tmp_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600)) {
                let _ = fs::remove_file(&tmp_path);
                return Err(storage_err("cannot restrict", &tmp_path, e));
            }
        }

        Ok(tmp_path)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let path = self.entry_path(name);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err("cannot read", &path, e)),
        }
    }

    fn put(&self, name: &str, value: &str) -> Result<()> {
        let path = self.entry_path(name);
        let tmp_path = self.write_temp(name, value)?;

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(storage_err("cannot commit", &path, e));
        }

        debug!(entry = name, "stored key entry");
        Ok(())
    }

    /// Creates the entry with a hard link, which fails if the target
    /// exists, so two processes racing on the same name cannot both win.
    fn put_if_absent(&self, name: &str, value: &str) -> Result<Option<String>> {
        let path = self.entry_path(name);
        let tmp_path = self.write_temp(name, value)?;

        let linked = fs::hard_link(&tmp_path, &path);
        let _ = fs::remove_file(&tmp_path);

        match linked {
            Ok(()) => {
                debug!(entry = name, "created key entry");
                Ok(None)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => self.get(name)?.map(Some).ok_or_else(|| {
                LegacyVaultError::StorageFailure(format!(
                    "entry {} vanished while being created",
                    path.display()
                ))
            }),
            Err(e) => Err(storage_err("cannot commit", &path, e)),
        }
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let path = self.entry_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_err("cannot remove", &path, e)),
        }
    }

    fn names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_err("cannot list", &self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| storage_err("cannot list", &self.dir, e))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with('.') {
                continue;
            }
            if let Some(name) = file_name.strip_suffix(ENTRY_EXT) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("keys");
        let store = FileStore::open(&dir).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn put_get_roundtrip_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        FileStore::open(tmp.path()).unwrap().put("vault-key.v1", "abc=").unwrap();

        let reopened = FileStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.get("vault-key.v1").unwrap().as_deref(), Some("abc="));
    }

    #[test]
    fn put_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.put("a", "1").unwrap();
        store.put_if_absent("b", "2").unwrap();
        store.put_if_absent("b", "3").unwrap();

        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn put_if_absent_does_not_overwrite() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        assert!(store.put_if_absent("k", "first").unwrap().is_none());
        assert_eq!(
            store.put_if_absent("k", "second").unwrap().as_deref(),
            Some("first")
        );
    }

    #[test]
    fn names_lists_only_entries() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.put("vault-key.b", "x").unwrap();
        store.put("vault-key.a", "y").unwrap();
        fs::write(tmp.path().join("README"), "not a key").unwrap();

        assert_eq!(store.names().unwrap(), vec!["vault-key.a", "vault-key.b"]);
    }

    #[test]
    fn remove_reports_presence() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.put("k", "v").unwrap();
        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
        assert!(store.get("k").unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn entries_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.put("k", "v").unwrap();

        let mode = fs::metadata(tmp.path().join("k.key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
