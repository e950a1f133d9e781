//! Integration tests for the record vault, key stores and master password.

#![cfg(feature = "sqlite-store")]

use std::sync::Arc;

use tempfile::TempDir;

use securevault::auth::{FileCredentialStore, VaultAuth};
use securevault::config::Settings;
use securevault::crypto::FieldCipher;
use securevault::errors::VaultError;
use securevault::export::{BillFrequency, PlainBill, PlainCredential, PlainNote};
use securevault::keystore::{self, FileKeyStore, KeyGuard, KeyProvider};
use securevault::vault::{MemoryRecordStore, RecordKind, RecordStore, SqliteRecordStore, Vault};

/// Vault whose device key lives in `dir` behind a fixed keyfile secret.
fn file_backed_vault(dir: &TempDir) -> Vault<SqliteRecordStore> {
    let keys = FileKeyStore::new(dir.path().join("device.key"), &[7u8; 32]).unwrap();
    let cipher = FieldCipher::new(Arc::new(KeyGuard::new(keys)));
    let records = SqliteRecordStore::open(&dir.path().join("records.db")).unwrap();
    Vault::new(cipher, records)
}

fn credential() -> PlainCredential {
    PlainCredential {
        title: "Router".into(),
        username: "admin".into(),
        password: "n0t-admin".into(),
        url: "http://192.168.1.1".into(),
        notes: "reset button on the back".into(),
    }
}

#[test]
fn records_survive_a_restart() {
    let dir = TempDir::new().unwrap();

    let id = {
        let vault = file_backed_vault(&dir);
        vault.insert(&credential()).unwrap()
    };

    let vault = file_backed_vault(&dir);
    let entry = vault.get::<PlainCredential>(id).unwrap();
    assert_eq!(entry.record, credential());
    assert!(entry.timestamp > 0);
}

#[test]
fn database_never_holds_plaintext_secrets() {
    let dir = TempDir::new().unwrap();
    let vault = file_backed_vault(&dir);
    vault.insert(&credential()).unwrap();
    vault
        .insert(&PlainNote {
            title: "Safe".into(),
            content: "left 10, right 32".into(),
        })
        .unwrap();
    drop(vault);

    let raw = std::fs::read(dir.path().join("records.db")).unwrap();
    let contains = |needle: &str| raw.windows(needle.len()).any(|w| w == needle.as_bytes());
    assert!(contains("Router"));
    assert!(!contains("n0t-admin"));
    assert!(!contains("left 10, right 32"));
}

#[test]
fn another_device_key_cannot_read_rows() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("records.db");

    let id = {
        let vault = file_backed_vault(&dir);
        vault.insert(&credential()).unwrap()
    };

    let stranger = Vault::new(
        FieldCipher::new(Arc::new(KeyGuard::new(
            keystore::MemoryKeyStore::default(),
        ))),
        SqliteRecordStore::open(&db).unwrap(),
    );

    assert!(matches!(
        stranger.get::<PlainCredential>(id),
        Err(VaultError::AuthenticationFailed)
    ));
    // Listing clear metadata still works without the key.
    assert_eq!(stranger.summaries(RecordKind::Credential).unwrap()[0].label, "Router");
}

#[test]
fn wrong_keyfile_makes_the_vault_unavailable() {
    let dir = TempDir::new().unwrap();
    file_backed_vault(&dir).insert(&credential()).unwrap();

    let keys = FileKeyStore::new(dir.path().join("device.key"), &[8u8; 32]).unwrap();
    let vault = Vault::new(
        FieldCipher::new(Arc::new(KeyGuard::new(keys))),
        SqliteRecordStore::open(&dir.path().join("records.db")).unwrap(),
    );

    let err = vault.get::<PlainCredential>(1).unwrap_err();
    assert!(matches!(err, VaultError::KeyUnavailable(_)));
}

#[test]
fn open_store_uses_settings_paths() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();

    let first = KeyGuard::new(keystore::open_store(&settings, dir.path()).unwrap())
        .get_or_create_key()
        .unwrap();
    assert!(settings.device_key_path(dir.path()).exists());
    assert!(settings.keyfile_path(dir.path()).exists());

    let second = KeyGuard::new(keystore::open_store(&settings, dir.path()).unwrap())
        .get_or_create_key()
        .unwrap();
    assert_eq!(*first, *second);
}

#[test]
fn memory_and_sqlite_stores_agree() {
    let stores: Vec<Box<dyn RecordStore>> = vec![
        Box::new(MemoryRecordStore::default()),
        Box::new(SqliteRecordStore::open_in_memory().unwrap()),
    ];

    for store in stores {
        let cipher = FieldCipher::new(Arc::new(KeyGuard::new(
            keystore::MemoryKeyStore::default(),
        )));
        let vault = Vault::new(cipher, store);

        let bill = PlainBill {
            bill_name: "Internet".into(),
            amount: "59.99".into(),
            notes: "".into(),
            due_date: 1_706_745_600_000,
            frequency: BillFrequency::Monthly,
        };
        let a = vault.insert(&bill).unwrap();
        let b = vault.insert(&bill).unwrap();
        assert_eq!((a, b), (1, 2));

        vault.delete(RecordKind::Bill, a).unwrap();
        let remaining = vault.list::<PlainBill>().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 2);
        assert_eq!(remaining[0].record, bill);

        assert!(matches!(
            vault.update(7, &bill),
            Err(VaultError::RecordNotFound {
                kind: RecordKind::Bill,
                id: 7
            })
        ));
    }
}

#[test]
fn master_password_persists_in_auth_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".securevault").join("auth.json");

    VaultAuth::new(FileCredentialStore::new(&path))
        .setup_master_password("Tr0ub4dor&3")
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert!(json["auth_salt"].is_string());
    assert!(json["auth_hash"].is_string());

    let reopened = VaultAuth::new(FileCredentialStore::new(&path));
    assert!(reopened.is_setup().unwrap());
    assert!(reopened.verify_master_password("Tr0ub4dor&3").unwrap());
    assert!(!reopened.verify_master_password("tr0ub4dor&3").unwrap());
}
