//! Application settings management
//!
//! Stores non-sensitive configuration in a plain JSON file next to the
//! secret store.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::crypto::KeyDerivationParams;
use crate::error::{Result, VaultError};

/// File name of the default secret store inside the data directory
const DEFAULT_STORE_FILE: &str = "secrets.json";

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Key derivation cost for newly sealed secrets
    pub kdf: KeyDerivationParams,
    /// Secret store location (defaults to `secrets.json` in the data directory)
    pub store_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            kdf: KeyDerivationParams::default(),
            store_file: None,
        }
    }
}

/// Get the per-user data directory
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("io", "config-vault", "config-vault")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| VaultError::Storage("Could not determine data directory".to_string()))
}

/// Settings manager
pub struct SettingsManager {
    data_dir: PathBuf,
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `data_dir`, or fall back to defaults
    pub fn new(data_dir: &Path) -> Result<Self> {
        let settings_file = data_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file)?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            settings_file,
            settings,
        })
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        tokio::fs::create_dir_all(&self.data_dir).await?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Update settings and save
    pub async fn update(&mut self, settings: Settings) -> Result<()> {
        self.settings = settings;
        self.save().await
    }

    /// Resolved secret store path
    pub fn store_path(&self) -> PathBuf {
        match &self.settings.store_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.data_dir.join(path),
            None => self.data_dir.join(DEFAULT_STORE_FILE),
        }
    }

    /// Data directory these settings belong to
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path()).unwrap();

        assert_eq!(manager.get().version, 1);
        assert_eq!(manager.get().kdf, KeyDerivationParams::default());
        assert_eq!(manager.store_path(), temp_dir.path().join("secrets.json"));
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path()).unwrap();
            manager.get_mut().kdf.iterations = 5;
            manager.get_mut().store_file = Some(PathBuf::from("team/secrets.json"));
            manager.save().await.unwrap();
        }

        {
            let manager = SettingsManager::new(temp_dir.path()).unwrap();
            assert_eq!(manager.get().kdf.iterations, 5);
            assert_eq!(
                manager.store_path(),
                temp_dir.path().join("team/secrets.json")
            );
        }
    }

    #[tokio::test]
    async fn test_update() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path()).unwrap();

        let settings = Settings {
            kdf: KeyDerivationParams {
                memory_cost: 4096,
                iterations: 2,
                parallelism: 1,
            },
            ..Settings::default()
        };
        manager.update(settings.clone()).await.unwrap();

        let reloaded = SettingsManager::new(temp_dir.path()).unwrap();
        assert_eq!(reloaded.get(), &settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("settings.json"),
            r#"{"kdf":{"memoryCost":2048,"iterations":1,"parallelism":1}}"#,
        )
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path()).unwrap();
        assert_eq!(manager.get().version, 1);
        assert_eq!(manager.get().kdf.memory_cost, 2048);
        assert!(manager.get().store_file.is_none());
    }

    #[test]
    fn test_corrupt_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "{").unwrap();

        assert!(matches!(
            SettingsManager::new(temp_dir.path()),
            Err(VaultError::Serialization(_))
        ));
    }
}
