//! End-to-end behaviour of the secret store through the public API

use tempfile::TempDir;
use vault_core::{
    decrypt, derive_key, encrypt, generate_salt, JsonFileStorage, KeyDerivationParams,
    SecretEntry, SecretStore, VaultError,
};

fn fast_params() -> KeyDerivationParams {
    KeyDerivationParams {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

#[test]
fn roundtrip_law_holds_for_derived_keys() {
    let salt = generate_salt();
    let plaintexts: [&[u8]; 4] = [b"", b"s3cr3t", "pässwörd".as_bytes(), &[0u8; 1024]];

    for plaintext in plaintexts {
        let ciphertext = encrypt(plaintext, &derive_key("hunter2", &salt, &fast_params()).unwrap()).unwrap();
        let key = derive_key("hunter2", &salt, &fast_params()).unwrap();
        assert_eq!(decrypt(&ciphertext, &key).unwrap(), plaintext);
    }
}

#[test]
fn reencryption_differs_but_decrypts_identically() {
    let key = derive_key("hunter2", &generate_salt(), &fast_params()).unwrap();

    let first = encrypt(b"same", &key).unwrap();
    let second = encrypt(b"same", &key).unwrap();

    assert_ne!(first, second);
    assert_eq!(decrypt(&first, &key).unwrap(), decrypt(&second, &key).unwrap());
}

#[tokio::test]
async fn db_password_example() {
    let store = SecretStore::new(fast_params());

    store
        .put("db.password", b"s3cr3t", true, Some("hunter2"))
        .await
        .unwrap();

    let value = store.get("db.password", "hunter2").await.unwrap();
    assert_eq!(value.to_str().unwrap(), "s3cr3t");

    let wrong = store.get("db.password", "wrong").await;
    assert!(matches!(wrong, Err(VaultError::Decryption(_))));
}

#[tokio::test]
async fn unknown_name_is_not_found() {
    let store = SecretStore::new(fast_params());
    store.put("db.user", b"admin", false, None).await.unwrap();

    for name in ["db.password", "", "DB.USER"] {
        assert!(matches!(
            store.get(name, "hunter2").await,
            Err(VaultError::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn duplicate_load_leaves_state_unchanged() {
    let store = SecretStore::new(fast_params());
    store
        .put("db.password", b"s3cr3t", true, Some("hunter2"))
        .await
        .unwrap();
    let before = store.entries().await;

    let result = store
        .load(vec![
            SecretEntry::plain("a", "1"),
            SecretEntry::plain("a", "2"),
        ])
        .await;

    assert!(matches!(result, Err(VaultError::DuplicateKey(_))));
    assert_eq!(store.entries().await, before);
    assert_eq!(
        store.get("db.password", "hunter2").await.unwrap().expose(),
        b"s3cr3t"
    );
}

#[tokio::test]
async fn entries_survive_persistence() {
    let temp_dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(temp_dir.path().join("secrets.json"));

    let store = SecretStore::new(fast_params());
    store
        .put("db.password", b"s3cr3t", true, Some("hunter2"))
        .await
        .unwrap();
    store.put("db.user", b"admin", false, None).await.unwrap();
    store.save_to(&storage).await.unwrap();

    let on_disk = std::fs::read_to_string(storage.path()).unwrap();
    assert!(!on_disk.contains("s3cr3t"));

    let reloaded = SecretStore::new(fast_params());
    reloaded.load_from(&storage).await.unwrap();

    assert_eq!(reloaded.names().await, vec!["db.password", "db.user"]);
    assert_eq!(
        reloaded.get("db.password", "hunter2").await.unwrap().expose(),
        b"s3cr3t"
    );
    assert_eq!(reloaded.get("db.user", "").await.unwrap().expose(), b"admin");
}

#[tokio::test]
async fn tampered_persisted_entry_fails_to_decrypt() {
    let store = SecretStore::new(fast_params());
    store
        .put("db.password", b"s3cr3t", true, Some("hunter2"))
        .await
        .unwrap();

    let mut entries = store.entries().await;
    let last = entries[0].ciphertext.len() - 1;
    entries[0].ciphertext[last] ^= 0x01;

    let tampered = SecretStore::new(fast_params());
    tampered.load(entries).await.unwrap();

    assert!(matches!(
        tampered.get("db.password", "hunter2").await,
        Err(VaultError::Decryption(_))
    ));
}

#[tokio::test]
async fn persisted_entries_survive_kdf_cost_change() {
    let temp_dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(temp_dir.path().join("secrets.json"));

    let store = SecretStore::new(fast_params());
    store
        .put("db.password", b"s3cr3t", true, Some("hunter2"))
        .await
        .unwrap();
    store.save_to(&storage).await.unwrap();

    let reloaded = SecretStore::new(KeyDerivationParams {
        iterations: 2,
        ..fast_params()
    });
    reloaded.load_from(&storage).await.unwrap();

    assert_eq!(
        reloaded.get("db.password", "hunter2").await.unwrap().expose(),
        b"s3cr3t"
    );
    assert!(matches!(
        reloaded.get("db.password", "wrong").await,
        Err(VaultError::Decryption(_))
    ));
}
