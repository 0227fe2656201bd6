//! Subcommand implementations

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use vault_core::{
    ConfigProcessor, JsonFileStorage, KeyDerivationParams, ProcessReport, SecretStore,
    SettingsManager, StringEncryptor,
};

/// Shared state for running one subcommand
pub struct CommandContext<'a> {
    settings: &'a SettingsManager,
}

impl<'a> CommandContext<'a> {
    pub fn new(settings: &'a SettingsManager) -> Self {
        Self { settings }
    }

    fn params(&self) -> KeyDerivationParams {
        self.settings.get().kdf
    }

    fn storage(&self) -> JsonFileStorage {
        JsonFileStorage::new(self.settings.store_path())
    }

    async fn open_store(&self) -> Result<(SecretStore, JsonFileStorage)> {
        let storage = self.storage();
        let store = SecretStore::new(self.params());
        store
            .load_from(&storage)
            .await
            .with_context(|| format!("Failed to load secrets from {}", storage.path().display()))?;
        Ok((store, storage))
    }

    pub fn encrypt(&self, text: &str, passphrase: &str, out: &mut impl Write) -> Result<()> {
        let encryptor = StringEncryptor::new(passphrase, self.params())?;
        writeln!(out, "ENC({})", encryptor.encrypt(text)?)?;
        Ok(())
    }

    pub fn decrypt(&self, text: &str, passphrase: &str, out: &mut impl Write) -> Result<()> {
        let text = text.trim();
        let inner = text
            .strip_prefix("ENC(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(text);

        let encryptor = StringEncryptor::new(passphrase, self.params())?;
        writeln!(out, "{}", encryptor.decrypt(inner)?)?;
        Ok(())
    }

    pub async fn process(&self, paths: &[PathBuf], out: &mut impl Write) -> Result<()> {
        let processor = ConfigProcessor::new(self.params());

        let mut total = ProcessReport::default();
        for path in paths {
            let report = processor
                .process_path(path)
                .await
                .with_context(|| format!("Failed to process {}", path.display()))?;
            total.merge(report);
        }

        for path in &total.processed {
            writeln!(out, "processed  {}", path.display())?;
        }
        for path in &total.untouched {
            writeln!(out, "untouched  {}", path.display())?;
        }
        writeln!(
            out,
            "{} file(s) rewritten: {} value(s) encrypted, {} decrypted",
            total.processed.len(),
            total.encrypted,
            total.decrypted
        )?;
        Ok(())
    }

    /// Store a secret; it is encrypted when a passphrase is given
    pub async fn put(&self, name: &str, value: &str, passphrase: Option<&str>) -> Result<()> {
        let (store, storage) = self.open_store().await?;
        store
            .put(name, value.as_bytes(), passphrase.is_some(), passphrase)
            .await?;
        store.save_to(&storage).await?;
        Ok(())
    }

    /// Whether reading `name` requires a passphrase
    pub async fn needs_passphrase(&self, name: &str) -> Result<bool> {
        let (store, _) = self.open_store().await?;
        let entry = store
            .entries()
            .await
            .into_iter()
            .find(|entry| entry.name == name);
        match entry {
            Some(entry) => Ok(entry.is_encrypted),
            None => bail!("Secret not found: {}", name),
        }
    }

    pub async fn get(&self, name: &str, passphrase: Option<&str>, out: &mut impl Write) -> Result<()> {
        let (store, _) = self.open_store().await?;
        let value = store.get(name, passphrase.unwrap_or_default()).await?;
        writeln!(out, "{}", value.to_str()?)?;
        Ok(())
    }

    pub async fn list(&self, out: &mut impl Write) -> Result<()> {
        let (store, _) = self.open_store().await?;
        for entry in store.entries().await {
            let kind = if entry.is_encrypted { "encrypted" } else { "plain" };
            writeln!(out, "{}\t{}", entry.name, kind)?;
        }
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        let (store, storage) = self.open_store().await?;
        store.remove(name).await?;
        store.save_to(&storage).await?;
        Ok(())
    }

    pub async fn rotate(&self, old: &str, new: &str, out: &mut impl Write) -> Result<()> {
        let (store, storage) = self.open_store().await?;
        let count = store
            .rotate_passphrase(old, new)
            .await
            .context("Failed to re-encrypt secrets with the current passphrase")?;
        store.save_to(&storage).await?;

        info!("Rotated {} secrets in {:?}", count, storage.path());
        writeln!(out, "{} secret(s) re-encrypted", count)?;
        Ok(())
    }
}
