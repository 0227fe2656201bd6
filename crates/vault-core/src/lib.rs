//! # vault-core
//!
//! Core functionality for Config Vault including:
//! - AES-256-GCM encryption with Argon2id key derivation
//! - An in-memory secret store with per-entry sealed values
//! - `ENC(...)` placeholder processing for `.properties` and `.yml` files
//! - JSON file persistence and settings with zeroize-on-drop secrets

pub mod config_file;
pub mod crypto;
pub mod encryptor;
pub mod error;
pub mod settings;
pub mod storage;
pub mod store;

pub use config_file::{ConfigFileKind, ConfigProcessor, ProcessReport};
pub use crypto::{
    decrypt, derive_key, encrypt, generate_salt, open, seal, sealed_params, DerivedKey,
    KeyDerivationParams, SecretBytes, StringEncryptor,
};
pub use encryptor::{resolve_password, EncryptorConfig};
pub use error::{Result, VaultError};
pub use settings::{default_data_dir, Settings, SettingsManager};
pub use storage::{EntryStorage, JsonFileStorage};
pub use store::{SecretEntry, SecretStore};
