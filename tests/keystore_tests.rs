//! Integration tests for the local key store.

use std::sync::{Arc, Barrier};
use std::thread;

use legacyvault::crypto::VaultKey;
use legacyvault::keystore::{FileStore, KeyStore, KeyValueStore, MemoryStore};
use tempfile::TempDir;

const THREADS: usize = 16;

fn race_ensure<S, F>(make_store: F) -> Vec<VaultKey>
where
    S: KeyValueStore + 'static,
    F: Fn() -> KeyStore<S>,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = make_store();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.ensure("v1").unwrap()
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn all_equal(keys: &[VaultKey]) -> bool {
    keys.windows(2).all(|w| w[0] == w[1])
}

// ---------------------------------------------------------------------------
// Concurrent generation
// ---------------------------------------------------------------------------

#[test]
fn concurrent_ensure_on_one_store_yields_one_key() {
    let store = Arc::new(KeyStore::new(MemoryStore::new()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.ensure("v1").unwrap()
            })
        })
        .collect();
    let keys: Vec<VaultKey> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(all_equal(&keys));
    assert_eq!(store.get("v1").unwrap().as_ref(), keys.first());
}

#[test]
fn concurrent_ensure_across_key_stores_sharing_memory() {
    let backend = Arc::new(MemoryStore::new());
    let keys = race_ensure(|| KeyStore::new(Arc::clone(&backend)));
    assert!(all_equal(&keys));
}

#[test]
fn concurrent_ensure_across_file_stores_sharing_a_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().to_path_buf();
    let keys = race_ensure(|| KeyStore::new(FileStore::open(&dir).unwrap()));
    assert!(all_equal(&keys));

    let reopened = KeyStore::new(FileStore::open(&dir).unwrap());
    assert_eq!(reopened.get("v1").unwrap().as_ref(), keys.first());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn file_store_key_survives_restart() {
    let tmp = TempDir::new().unwrap();
    let key = KeyStore::new(FileStore::open(tmp.path()).unwrap())
        .ensure("estate-2024")
        .unwrap();

    let restarted = KeyStore::new(FileStore::open(tmp.path()).unwrap());
    assert_eq!(restarted.get("estate-2024").unwrap(), Some(key));
    assert_eq!(restarted.vault_ids().unwrap(), vec!["estate-2024"]);
}

#[test]
fn separate_vaults_get_separate_keys() {
    let store = KeyStore::new(MemoryStore::new());
    let a = store.ensure("a").unwrap();
    let b = store.ensure("b").unwrap();
    assert_ne!(a, b);
}

#[test]
fn path_like_identifiers_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let store = KeyStore::new(FileStore::open(tmp.path()).unwrap());
    assert!(store.ensure("../escape").is_err());
    assert!(store.ensure("a/b").is_err());
    assert!(store.vault_ids().unwrap().is_empty());
}
