//! In-memory secret store

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::types::SecretEntry;
use crate::crypto::{is_sealed, open, seal, KeyDerivationParams, SecretBytes};
use crate::error::{Result, VaultError};
use crate::storage::EntryStorage;

/// Named configuration values, some of them sealed under a passphrase
///
/// Cloning is cheap and clones share the same entries. Key derivation runs on
/// the blocking thread pool and never while the entry lock is held, except
/// during [`SecretStore::rotate_passphrase`], which must be atomic as a whole.
#[derive(Clone)]
pub struct SecretStore {
    /// Entries by name
    entries: Arc<RwLock<HashMap<String, SecretEntry>>>,
    /// Key derivation cost for newly sealed values
    params: KeyDerivationParams,
}

impl SecretStore {
    /// Create an empty store with the given key derivation parameters
    pub fn new(params: KeyDerivationParams) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            params,
        }
    }

    /// Key derivation parameters used by this store
    pub fn params(&self) -> &KeyDerivationParams {
        &self.params
    }

    /// Replace all entries at once
    ///
    /// The batch is validated before anything changes: a repeated name fails
    /// with [`VaultError::DuplicateKey`] and an encrypted entry that is not a
    /// well-formed sealed value fails with [`VaultError::InvalidInput`].
    pub async fn load(&self, entries: Vec<SecretEntry>) -> Result<()> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(VaultError::DuplicateKey(entry.name.clone()));
            }
            if entry.is_encrypted && !is_sealed(&entry.ciphertext) {
                return Err(VaultError::InvalidInput(format!(
                    "Entry {} is marked encrypted but is not a sealed value",
                    entry.name
                )));
            }
        }
        drop(seen);

        let map: HashMap<String, SecretEntry> = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        let count = map.len();

        *self.entries.write().await = map;

        info!("Loaded {} secret entries", count);
        Ok(())
    }

    /// Get the plaintext value of a secret
    ///
    /// Encrypted entries are opened with `passphrase` and the key derivation
    /// cost they were sealed with; plain entries ignore the passphrase.
    pub async fn get(&self, name: &str, passphrase: &str) -> Result<SecretBytes> {
        let entry = self
            .entries
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(name.to_string()))?;

        debug!("Retrieved secret entry: {}", name);

        if !entry.is_encrypted {
            return Ok(SecretBytes::new(entry.ciphertext));
        }

        let passphrase = Zeroizing::new(passphrase.to_owned());
        let plaintext =
            tokio::task::spawn_blocking(move || open(&entry.ciphertext, passphrase.as_str()))
                .await??;

        Ok(SecretBytes::new(plaintext))
    }

    /// Insert or replace a secret
    ///
    /// With `encrypt` set, `passphrase` is required and the value is sealed
    /// with a fresh salt and IV; otherwise the raw bytes are stored.
    pub async fn put(
        &self,
        name: &str,
        value: &[u8],
        encrypt: bool,
        passphrase: Option<&str>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(VaultError::InvalidInput(
                "Secret name must not be empty".to_string(),
            ));
        }

        let entry = if encrypt {
            let passphrase = passphrase.ok_or_else(|| {
                VaultError::InvalidInput(format!("A passphrase is required to encrypt {}", name))
            })?;
            let passphrase = Zeroizing::new(passphrase.to_owned());
            let value = Zeroizing::new(value.to_vec());
            let params = self.params;
            let sealed = tokio::task::spawn_blocking(move || {
                seal(value.as_slice(), passphrase.as_str(), &params)
            })
            .await??;
            SecretEntry::sealed(name, sealed)
        } else {
            SecretEntry::plain(name, value)
        };

        self.entries.write().await.insert(name.to_string(), entry);

        info!("Stored secret entry: {} (encrypted: {})", name, encrypt);
        Ok(())
    }

    /// Remove a secret
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(name)
            .ok_or_else(|| VaultError::NotFound(name.to_string()))?;

        info!("Removed secret entry: {}", name);
        Ok(())
    }

    /// Check whether a secret exists
    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }

    /// All secret names, sorted
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of stored secrets
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no secrets
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of all entries, sorted by name
    pub async fn entries(&self) -> Vec<SecretEntry> {
        let mut entries: Vec<SecretEntry> = self.entries.read().await.values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Re-seal every encrypted entry under a new passphrase
    ///
    /// Entries are re-sealed with this store's current key derivation cost.
    /// All or nothing: if any entry fails to open with `old`, no entry changes.
    /// Returns the number of entries rotated.
    pub async fn rotate_passphrase(&self, old: &str, new: &str) -> Result<usize> {
        if new.is_empty() {
            return Err(VaultError::InvalidInput(
                "New passphrase must not be empty".to_string(),
            ));
        }

        let mut entries = self.entries.write().await;

        let encrypted: Vec<SecretEntry> = entries
            .values()
            .filter(|entry| entry.is_encrypted)
            .cloned()
            .collect();

        let old = Zeroizing::new(old.to_owned());
        let new = Zeroizing::new(new.to_owned());
        let params = self.params;
        let rotated = tokio::task::spawn_blocking(move || {
            encrypted
                .into_iter()
                .map(|entry| -> Result<SecretEntry> {
                    let plaintext = Zeroizing::new(open(&entry.ciphertext, old.as_str())?);
                    let sealed = seal(plaintext.as_slice(), new.as_str(), &params)?;
                    Ok(SecretEntry::sealed(entry.name, sealed))
                })
                .collect::<Result<Vec<SecretEntry>>>()
        })
        .await??;

        let count = rotated.len();
        for entry in rotated {
            entries.insert(entry.name.clone(), entry);
        }

        info!("Rotated passphrase for {} secret entries", count);
        Ok(count)
    }

    /// Replace all entries with those held by a storage backend
    pub async fn load_from(&self, storage: &dyn EntryStorage) -> Result<()> {
        let entries = storage.load_entries().await?;
        debug!("Read {} entries from {}", entries.len(), storage.backend_name());
        self.load(entries).await
    }

    /// Write a snapshot of all entries to a storage backend
    pub async fn save_to(&self, storage: &dyn EntryStorage) -> Result<()> {
        let entries = self.entries().await;
        storage.save_entries(&entries).await?;
        debug!("Wrote {} entries to {}", entries.len(), storage.backend_name());
        Ok(())
    }
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new(KeyDerivationParams::default())
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
