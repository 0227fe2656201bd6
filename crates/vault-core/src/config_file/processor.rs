//! Batch processing of configuration files and directories

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::placeholder::{count_placeholders, toggle_placeholders, ToggleOutcome};
use super::ConfigFileKind;
use crate::crypto::KeyDerivationParams;
use crate::encryptor::EncryptorConfig;
use crate::error::{Result, VaultError};

/// Summary of a processing run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    /// Files that were rewritten
    pub processed: Vec<PathBuf>,
    /// Supported files left as they were
    pub untouched: Vec<PathBuf>,
    /// Placeholders sealed across all files
    pub encrypted: usize,
    /// Placeholders opened across all files
    pub decrypted: usize,
}

impl ProcessReport {
    fn untouched(path: &Path) -> Self {
        Self {
            untouched: vec![path.to_path_buf()],
            ..Self::default()
        }
    }

    /// Fold another run's results into this one
    pub fn merge(&mut self, other: ProcessReport) {
        self.processed.extend(other.processed);
        self.untouched.extend(other.untouched);
        self.encrypted += other.encrypted;
        self.decrypted += other.decrypted;
    }
}

/// Toggles `ENC(...)` placeholders in `.properties` and `.yml` files
#[derive(Debug, Clone, Default)]
pub struct ConfigProcessor {
    /// Key derivation cost for settings a file leaves unspecified
    defaults: KeyDerivationParams,
}

impl ConfigProcessor {
    /// Create a processor with default key derivation parameters
    pub fn new(defaults: KeyDerivationParams) -> Self {
        Self { defaults }
    }

    /// Process a single file or every supported file below a directory
    pub async fn process_path(&self, path: &Path) -> Result<ProcessReport> {
        let metadata = tokio::fs::metadata(path).await?;

        if metadata.is_dir() {
            return self.process_directory(path).await;
        }

        if ConfigFileKind::from_path(path).is_none() {
            return Err(VaultError::UnsupportedFile(path.to_path_buf()));
        }

        self.process_located(path, true).await
    }

    /// Process every supported file below `dir`
    ///
    /// Files with placeholders but without encryptor settings are skipped
    /// with a warning.
    pub async fn process_directory(&self, dir: &Path) -> Result<ProcessReport> {
        let files = collect_config_files(dir).await?;
        debug!("Found {} config files under {:?}", files.len(), dir);

        let mut report = ProcessReport::default();
        for file in files {
            report.merge(self.process_located(&file, false).await?);
        }

        Ok(report)
    }

    /// Look up the settings for `path` only if it has placeholders to toggle
    async fn process_located(&self, path: &Path, require_settings: bool) -> Result<ProcessReport> {
        let content = tokio::fs::read_to_string(path).await?;
        if count_placeholders(&content) == 0 {
            debug!("No ENC() placeholders in {:?}", path);
            return Ok(ProcessReport::untouched(path));
        }

        match EncryptorConfig::locate(path).await? {
            Some(config) => self.process_file(path, &config).await,
            None if require_settings => Err(VaultError::Config(format!(
                "No encryptor settings found for {}",
                path.display()
            ))),
            None => {
                warn!("No encryptor settings found for {:?}, skipping", path);
                Ok(ProcessReport::untouched(path))
            }
        }
    }

    /// Toggle the placeholders of one file using the given settings
    pub async fn process_file(&self, path: &Path, config: &EncryptorConfig) -> Result<ProcessReport> {
        let content = tokio::fs::read_to_string(path).await?;
        if count_placeholders(&content) == 0 {
            debug!("No ENC() placeholders in {:?}", path);
            return Ok(ProcessReport::untouched(path));
        }

        let encryptor = config.encryptor(&self.defaults)?;

        let outcome = tokio::task::spawn_blocking(move || toggle_placeholders(&content, &encryptor))
            .await??;

        let mut report = ProcessReport::default();
        match outcome {
            Some(ToggleOutcome {
                content,
                encrypted,
                decrypted,
            }) => {
                write_atomic(path, &content).await?;
                info!(
                    "Processed {:?}: {} encrypted, {} decrypted",
                    path, encrypted, decrypted
                );
                report.processed.push(path.to_path_buf());
                report.encrypted = encrypted;
                report.decrypted = decrypted;
            }
            None => {
                debug!("No ENC() placeholders in {:?}", path);
                report.untouched.push(path.to_path_buf());
            }
        }

        Ok(report)
    }
}

/// Recursively list supported config files below `dir`, sorted
async fn collect_config_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && ConfigFileKind::from_path(&path).is_some() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Replace a file's contents via a temp file and rename, keeping its permissions
async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let mut temp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| VaultError::UnsupportedFile(path.to_path_buf()))?;
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let permissions = tokio::fs::metadata(path).await?.permissions();

    let result = async {
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::set_permissions(&temp_path, permissions).await?;
        tokio::fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}
