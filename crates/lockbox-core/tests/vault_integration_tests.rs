//! End-to-end flows over real temp directories: create, populate, process a
//! resource tree, round-trip the missing-secrets report back into the vault.

use assert_fs::TempDir;
use assert_fs::prelude::*;

use lockbox_core::config::VaultConfig;
use lockbox_core::template::TemplateProcessor;
use lockbox_core::vault::{Passphrase, VaultStore};

fn config_for(temp: &TempDir) -> VaultConfig {
    VaultConfig::new()
        .with_vault_file(temp.path().join(".vault"))
        .with_passphrase_file(temp.path().join(".vault_passphrase"))
        .with_resource_path(temp.path().join("build"))
        .with_missing_secrets_file(temp.path().join(".vault_missing_secrets"))
}

fn open(temp: &TempDir, passphrase: &str) -> VaultStore {
    VaultStore::open_with(config_for(temp), Passphrase::from(passphrase.to_owned())).unwrap()
}

#[test]
fn full_secret_lifecycle() {
    let temp = TempDir::new().unwrap();

    let mut store = open(&temp, "hunter2");
    store.create().unwrap();
    store.add_secret("db.password", "s3cr3t").unwrap();

    // A fresh open sees the persisted state
    let store = open(&temp, "hunter2");
    store.assert_access().unwrap();
    assert_eq!(store.reveal_secret("db.password").unwrap(), "s3cr3t");

    let mut store = open(&temp, "hunter2");
    store.remove_secret("db.password").unwrap();
    let store = open(&temp, "hunter2");
    assert!(store.reveal_secret("db.password").is_err());
}

#[test]
fn passphrase_file_unlocks_persisted_vault() {
    let temp = TempDir::new().unwrap();
    temp.child(".vault_passphrase").write_str("hunter2\n").unwrap();

    let mut store = VaultStore::open_with(
        config_for(&temp),
        Passphrase::from("hunter2".to_owned()),
    )
    .unwrap();
    store.create().unwrap();
    store.add_secret("api.key", "abc123").unwrap();

    // Reopen resolving the passphrase from the file on disk. Skipped when
    // the calling shell pins VAULT_PASSPHRASE, which shadows the file.
    if std::env::var_os("VAULT_PASSPHRASE").is_none() {
        let store = VaultStore::open(config_for(&temp)).unwrap();
        assert_eq!(store.reveal_secret("api.key").unwrap(), "abc123");
    }
}

#[test]
fn process_then_import_missing_then_reprocess() {
    let temp = TempDir::new().unwrap();
    temp.child("build/conf/app.properties")
        .write_str("url=@@vault.db.host@@\nuser=@@vault.db.user@@\nstatic=1\n")
        .unwrap();

    let mut store = open(&temp, "hunter2");
    store.create().unwrap();
    store.add_secret("vault.db.host", "10.0.0.5").unwrap();

    // First pass: one token resolves, one lands in the report
    let summary = TemplateProcessor::new(&store).process().unwrap();
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.replaced, 1);
    assert_eq!(summary.missing, vec!["vault.db.user"]);
    temp.child("build/conf/app.properties")
        .assert("url=10.0.0.5\nuser=@@vault.db.user@@\nstatic=1\n");
    temp.child(".vault_missing_secrets")
        .assert("vault.db.user;fill_me\n");

    // Operator fills the report in, then bulk-imports it
    temp.child(".vault_missing_secrets")
        .write_str("vault.db.user;app_rw\n")
        .unwrap();
    let mut store = open(&temp, "hunter2");
    assert_eq!(store.add_missing_secrets().unwrap(), 1);

    // Second pass resolves the remaining token
    let store = open(&temp, "hunter2");
    let summary = TemplateProcessor::new(&store).process().unwrap();
    assert_eq!(summary.replaced, 1);
    assert!(summary.missing.is_empty());
    temp.child("build/conf/app.properties")
        .assert("url=10.0.0.5\nuser=app_rw\nstatic=1\n");
}

#[test]
fn processing_only_touches_matching_files() {
    let temp = TempDir::new().unwrap();
    temp.child("build/conf/app.properties")
        .write_str("host=@@vault.host@@\n")
        .unwrap();
    temp.child("build/readme.txt")
        .write_str("host=@@vault.host@@\n")
        .unwrap();

    let mut store = open(&temp, "hunter2");
    store.create().unwrap();
    store.add_secret("vault.host", "10.0.0.5").unwrap();

    let summary = TemplateProcessor::new(&store).process().unwrap();
    assert_eq!(summary.files_processed, 1);
    temp.child("build/conf/app.properties").assert("host=10.0.0.5\n");
    temp.child("build/readme.txt").assert("host=@@vault.host@@\n");
}

#[test]
fn wrong_passphrase_cannot_reveal_or_mutate() {
    let temp = TempDir::new().unwrap();
    let mut store = open(&temp, "hunter2");
    store.create().unwrap();
    store.add_secret("db.password", "s3cr3t").unwrap();

    let mut wrong = open(&temp, "letmein");
    assert!(wrong.assert_access().is_err());
    assert!(wrong.reveal_secret("db.password").is_err());
    assert!(wrong.add_secret("x", "y").is_err());
    assert!(wrong.remove_secret("db.password").is_err());

    // And the right passphrase still works afterwards
    let store = open(&temp, "hunter2");
    assert_eq!(store.reveal_secret("db.password").unwrap(), "s3cr3t");
}
