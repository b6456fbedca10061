//! Pluggable key-value persistence behind the key store.
//!
//! Values are short text strings (base64 key material). Backends only
//! store and fetch; all key semantics live in `KeyStore`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::errors::Result;

/// Local persistence used by `KeyStore`.
///
/// Implementations must make each `put` atomic: a reader sees either
/// the previous value or the new one, never a partial write.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `name`, if any.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Store `value` under `name`, replacing any previous value.
    fn put(&self, name: &str, value: &str) -> Result<()>;

    /// Store `value` only if nothing is stored under `name` yet.
    ///
    /// Returns the value already present when the write was skipped.
    /// The default is a read-then-write; backends that can do better
    /// (an atomic create, a map entry) override it.
    fn put_if_absent(&self, name: &str, value: &str) -> Result<Option<String>> {
        if let Some(existing) = self.get(name)? {
            return Ok(Some(existing));
        }
        self.put(name, value)?;
        Ok(None)
    }

    /// Delete `name`. Returns `false` if there was nothing to delete.
    fn remove(&self, name: &str) -> Result<bool>;

    /// All stored names, sorted.
    fn names(&self) -> Result<Vec<String>>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, name: &str) -> Result<Option<String>> {
        (**self).get(name)
    }
    fn put(&self, name: &str, value: &str) -> Result<()> {
        (**self).put(name, value)
    }
    fn put_if_absent(&self, name: &str, value: &str) -> Result<Option<String>> {
        (**self).put_if_absent(name, value)
    }
    fn remove(&self, name: &str) -> Result<bool> {
        (**self).remove(name)
    }
    fn names(&self) -> Result<Vec<String>> {
        (**self).names()
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, name: &str) -> Result<Option<String>> {
        (**self).get(name)
    }
    fn put(&self, name: &str, value: &str) -> Result<()> {
        (**self).put(name, value)
    }
    fn put_if_absent(&self, name: &str, value: &str) -> Result<Option<String>> {
        (**self).put_if_absent(name, value)
    }
    fn remove(&self, name: &str) -> Result<bool> {
        (**self).remove(name)
    }
    fn names(&self) -> Result<Vec<String>> {
        (**self).names()
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Zeroizing<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(name).map(|v| v.as_str().to_owned()))
    }

    fn put(&self, name: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(name.to_string(), Zeroizing::new(value.to_string()));
        Ok(())
    }

    fn put_if_absent(&self, name: &str, value: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(name) {
            return Ok(Some(existing.as_str().to_owned()));
        }
        entries.insert(name.to_string(), Zeroizing::new(value.to_string()));
        Ok(None)
    }

    fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.entries.write().remove(name).is_some())
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_put_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get("a").unwrap().is_none());

        store.put("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn put_if_absent_keeps_first_value() {
        let store = MemoryStore::new();
        assert!(store.put_if_absent("k", "first").unwrap().is_none());
        assert_eq!(
            store.put_if_absent("k", "second").unwrap().as_deref(),
            Some("first")
        );
        assert_eq!(store.get("k").unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn names_are_sorted() {
        let store = MemoryStore::new();
        store.put("zeta", "z").unwrap();
        store.put("alpha", "a").unwrap();
        assert_eq!(store.names().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn shared_arc_sees_same_entries() {
        let shared = Arc::new(MemoryStore::new());
        let other = Arc::clone(&shared);
        shared.put("x", "1").unwrap();
        assert_eq!(other.get("x").unwrap().as_deref(), Some("1"));
    }
}
