//! Integration tests for the LegacyVault CLI.
//!
//! These run the binary end-to-end with `assert_cmd`. Passwords come from
//! `LEGACYVAULT_PASSWORD` and each test writes a `.legacyvault.toml` with
//! cheap Argon2 settings into its temp project directory.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use legacyvault::crypto::Argon2Params;
use legacyvault::keystore::MemoryStore;
use legacyvault::VaultCrypto;
use predicates::prelude::*;

const PASSWORD: &str = "test-password-123";

/// Helper: get a Command pointing at the legacyvault binary.
fn legacyvault() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("legacyvault").expect("binary should exist")
}

/// A temp project directory with fast KDF settings.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".legacyvault.toml")
        .write_str("argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n")
        .unwrap();
    tmp
}

/// Run the binary inside `dir` with the test password set.
fn run(dir: &TempDir, args: &[&str]) -> assert_cmd::assert::Assert {
    legacyvault()
        .current_dir(dir.path())
        .env("LEGACYVAULT_PASSWORD", PASSWORD)
        .env_remove("LEGACYVAULT_LOG")
        .args(args)
        .assert()
}

fn fast_engine() -> VaultCrypto<MemoryStore> {
    VaultCrypto::new(
        MemoryStore::new(),
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        },
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Help and version
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    legacyvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("digital legacy vault"))
        .stdout(predicate::str::contains("encrypt"))
        .stdout(predicate::str::contains("decrypt"))
        .stdout(predicate::str::contains("key"))
        .stdout(predicate::str::contains("identity"))
        .stdout(predicate::str::contains("seal"))
        .stdout(predicate::str::contains("recover"));
}

#[test]
fn version_flag_shows_version() {
    legacyvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("legacyvault"));
}

#[test]
fn version_command_shows_version() {
    legacyvault()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn no_args_shows_help() {
    legacyvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

#[test]
fn encrypt_then_decrypt_to_stdout() {
    let tmp = project();
    tmp.child("note.txt").write_str("hello world").unwrap();

    run(&tmp, &["encrypt", "--vault", "v1", "note.txt"])
        .success()
        .stdout(predicate::str::contains("Encrypted note.txt"));
    tmp.child("note.txt.lv.json")
        .assert(predicate::str::contains("wrapped_key"));
    tmp.child(".legacyvault/keys/vault-key.v1.key")
        .assert(predicate::path::exists());

    run(&tmp, &["decrypt", "--vault", "v1", "note.txt.lv.json"])
        .success()
        .stdout("hello world");
}

#[test]
fn decrypt_without_local_key_is_locked() {
    let tmp = project();
    tmp.child("note.txt").write_str("hello world").unwrap();
    run(&tmp, &["encrypt", "--vault", "v1", "note.txt"]).success();

    run(
        &tmp,
        &["--key-dir", "other-device", "decrypt", "--vault", "v1", "note.txt.lv.json"],
    )
    .failure()
    .stderr(predicate::str::contains("No vault key available"));
    tmp.child("other-device/vault-key.v1.key")
        .assert(predicate::path::missing());
}

#[test]
fn invalid_vault_id_rejected() {
    let tmp = project();
    tmp.child("note.txt").write_str("x").unwrap();
    run(&tmp, &["encrypt", "--vault", "../v1", "note.txt"])
        .failure()
        .stderr(predicate::str::contains("Invalid identifier"));
}

// ---------------------------------------------------------------------------
// Key management
// ---------------------------------------------------------------------------

#[test]
fn key_backup_forget_restore_cycle() {
    let tmp = project();
    tmp.child("will.txt").write_str("my will").unwrap();
    run(&tmp, &["encrypt", "--vault", "estate", "will.txt"]).success();

    run(&tmp, &["key", "backup", "estate", "--output", "estate.backup"]).success();
    run(&tmp, &["key", "forget", "estate", "--force"]).success();
    run(&tmp, &["key", "status", "estate"])
        .success()
        .stderr(predicate::str::contains("No vault key"));

    run(&tmp, &["key", "restore", "estate", "estate.backup"])
        .success()
        .stdout(predicate::str::contains("Restored"));
    run(&tmp, &["decrypt", "--vault", "estate", "will.txt.lv.json"])
        .success()
        .stdout("my will");
}

#[test]
fn key_restore_with_wrong_password_fails() {
    let tmp = project();
    tmp.child("a.txt").write_str("a").unwrap();
    run(&tmp, &["encrypt", "--vault", "v1", "a.txt"]).success();
    run(&tmp, &["key", "backup", "v1", "-o", "v1.backup"]).success();

    legacyvault()
        .current_dir(tmp.path())
        .env("LEGACYVAULT_PASSWORD", "not-the-password")
        .args(["--key-dir", "fresh", "key", "restore", "v1", "v1.backup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong password or corrupted backup"));
}

#[test]
fn key_list_shows_vaults() {
    let tmp = project();
    tmp.child("a.txt").write_str("a").unwrap();
    run(&tmp, &["encrypt", "--vault", "alpha", "a.txt"]).success();
    run(&tmp, &["encrypt", "--vault", "beta", "a.txt"]).success();

    run(&tmp, &["key", "list"])
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("beta"));
}

#[test]
fn short_new_password_rejected() {
    let tmp = project();
    tmp.child("a.txt").write_str("a").unwrap();
    run(&tmp, &["encrypt", "--vault", "v1", "a.txt"]).success();

    legacyvault()
        .current_dir(tmp.path())
        .env("LEGACYVAULT_PASSWORD", "short")
        .args(["key", "backup", "v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));
}

// ---------------------------------------------------------------------------
// Identities and sealing
// ---------------------------------------------------------------------------

#[test]
fn identity_new_and_unlock() {
    let tmp = project();
    run(&tmp, &["identity", "new", "--output", "me.identity"])
        .success()
        .stdout(predicate::str::contains("Fingerprint"));
    tmp.child("me.identity").assert(predicate::path::exists());

    run(&tmp, &["identity", "unlock", "--user", "alice", "me.identity"]).success();
    run(&tmp, &["identity", "show", "--user", "alice"])
        .success()
        .stdout(predicate::str::contains("Public key"));
}

#[test]
fn sealed_key_lets_participant_decrypt() {
    let tmp = project();
    tmp.child("letter.txt").write_str("dear family").unwrap();

    // Owner device encrypts.
    run(&tmp, &["--key-dir", "owner", "encrypt", "--vault", "v1", "letter.txt"]).success();

    // Participant's identity and its login backup.
    let (identity, backup) = fast_engine().create_identity(PASSWORD.as_bytes()).unwrap();
    tmp.child("bob.identity").write_str(&backup).unwrap();

    // Owner seals to the participant's public key.
    let public_key = identity.public_text();
    run(
        &tmp,
        &[
            "--key-dir",
            "owner",
            "seal",
            "--vault",
            "v1",
            public_key.as_str(),
            "--output",
            "v1.sealed",
        ],
    )
    .success();

    // Participant device: unlock identity, unseal, decrypt.
    run(
        &tmp,
        &["--key-dir", "bob", "identity", "unlock", "--user", "bob", "bob.identity"],
    )
    .success();
    run(
        &tmp,
        &["--key-dir", "bob", "unseal", "--vault", "v1", "--user", "bob", "v1.sealed"],
    )
    .success();
    run(
        &tmp,
        &["--key-dir", "bob", "decrypt", "--vault", "v1", "letter.txt.lv.json"],
    )
    .success()
    .stdout("dear family");
}

#[test]
fn recover_with_nothing_reports_locked() {
    let tmp = project();
    run(&tmp, &["recover", "--vault", "v1"])
        .failure()
        .stderr(predicate::str::contains("stays locked"));
}

#[test]
fn recover_prefers_sealed_then_falls_back_to_backup() {
    let tmp = project();
    tmp.child("a.txt").write_str("payload").unwrap();
    run(&tmp, &["--key-dir", "owner", "encrypt", "--vault", "v1", "a.txt"]).success();
    run(&tmp, &["--key-dir", "owner", "key", "backup", "v1", "-o", "v1.backup"]).success();

    // Sealed to a stranger, so the participant's identity cannot open it.
    let stranger = fast_engine().create_identity(PASSWORD.as_bytes()).unwrap().0;
    let stranger_key = stranger.public_text();
    run(
        &tmp,
        &["--key-dir", "owner", "seal", "--vault", "v1", stranger_key.as_str(), "-o", "v1.sealed"],
    )
    .success();

    let (_, backup) = fast_engine().create_identity(PASSWORD.as_bytes()).unwrap();
    tmp.child("me.identity").write_str(&backup).unwrap();
    run(&tmp, &["--key-dir", "new", "identity", "unlock", "--user", "me", "me.identity"]).success();

    run(
        &tmp,
        &[
            "--key-dir", "new", "recover", "--vault", "v1", "--sealed", "v1.sealed", "--user", "me",
            "--backup", "v1.backup",
        ],
    )
    .success()
    .stdout(predicate::str::contains("restored from password backup"));
}
