//! JSON file storage backend
//!
//! Stores every entry in a single JSON document. Sealed values are written as
//! base64 and are never decrypted by this backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::EntryStorage;
use crate::error::{Result, VaultError};
use crate::store::SecretEntry;

/// Current file format version
const FORMAT_VERSION: u32 = 1;

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    entries: Vec<SecretEntry>,
}

/// JSON file storage backend
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create a backend for the given file (created on first save)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EntryStorage for JsonFileStorage {
    async fn load_entries(&self) -> Result<Vec<SecretEntry>> {
        if !self.path.exists() {
            debug!("No existing storage file at {:?}", self.path);
            return Ok(Vec::new());
        }

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let file: StorageFile = serde_json::from_str(&contents)?;

        if file.version != FORMAT_VERSION {
            return Err(VaultError::Storage(format!(
                "Unsupported storage file version {} in {:?}",
                file.version, self.path
            )));
        }

        debug!("Loaded {} entries from {:?}", file.entries.len(), self.path);
        Ok(file.entries)
    }

    async fn save_entries(&self, entries: &[SecretEntry]) -> Result<()> {
        let file = StorageFile {
            version: FORMAT_VERSION,
            entries: entries.to_vec(),
        };
        let contents = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using a temp file
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!("Saved {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "JSON File Storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path().join("secrets.json"));

        assert!(storage.load_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path().join("nested/secrets.json"));

        let entries = vec![
            SecretEntry::plain("app.name", "demo"),
            SecretEntry::sealed("db.password", vec![1u8; 60]),
        ];
        storage.save_entries(&entries).await.unwrap();

        assert!(storage.path().exists());
        assert!(!storage.path().with_extension("tmp").exists());
        assert_eq!(storage.load_entries().await.unwrap(), entries);
    }

    #[tokio::test]
    async fn test_rejects_unknown_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.json");
        std::fs::write(&path, r#"{"version":99,"entries":[]}"#).unwrap();

        let result = JsonFileStorage::new(&path).load_entries().await;
        assert!(matches!(result, Err(VaultError::Storage(_))));
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.json");
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileStorage::new(&path).load_entries().await;
        assert!(matches!(result, Err(VaultError::Serialization(_))));
    }
}
