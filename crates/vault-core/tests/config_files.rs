//! Config-file processing through the public API

use tempfile::TempDir;
use vault_core::{ConfigProcessor, KeyDerivationParams, StringEncryptor, VaultError};

fn fast_params() -> KeyDerivationParams {
    KeyDerivationParams {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

#[tokio::test]
async fn password_placeholder_resolves_default() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("application.properties");
    std::fs::write(
        &file,
        "vault.encryptor.password=${CONFIG_VAULT_TEST_UNSET_VARIABLE:dev-pw}\napi.key=ENC(abc123)\n",
    )
    .unwrap();

    let processor = ConfigProcessor::new(fast_params());
    let report = processor.process_path(&file).await.unwrap();
    assert_eq!(report.encrypted, 1);

    // The rewritten value opens with the default password
    let content = std::fs::read_to_string(&file).unwrap();
    let sealed = content
        .lines()
        .find_map(|line| line.strip_prefix("api.key=ENC("))
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap();
    let encryptor = StringEncryptor::new("dev-pw", fast_params()).unwrap();
    assert_eq!(encryptor.decrypt(sealed).unwrap(), "abc123");
}

#[tokio::test]
async fn missing_password_variable_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("application.yml");
    std::fs::write(
        &file,
        "vault:\n  encryptor:\n    password: ${CONFIG_VAULT_TEST_UNSET_VARIABLE}\nkey: ENC(x)\n",
    )
    .unwrap();

    let result = ConfigProcessor::new(fast_params()).process_path(&file).await;
    assert!(matches!(
        result,
        Err(VaultError::MissingEnvironmentVariable(name)) if name == "CONFIG_VAULT_TEST_UNSET_VARIABLE"
    ));
    assert!(std::fs::read_to_string(&file).unwrap().contains("ENC(x)"));
}

#[tokio::test]
async fn wrong_password_leaves_file_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("application.properties");

    let sealed = StringEncryptor::new("right", fast_params())
        .unwrap()
        .encrypt("value")
        .unwrap();
    let original = format!("vault.encryptor.password=wrong\nkey=ENC({})\n", sealed);
    std::fs::write(&file, &original).unwrap();

    let result = ConfigProcessor::new(fast_params()).process_path(&file).await;
    assert!(matches!(result, Err(VaultError::Decryption(_))));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), original);
}
