//! Encryptor settings embedded in configuration files
//!
//! A configuration file can carry the passphrase and key derivation cost used
//! for its own `ENC(...)` values:
//!
//! ```properties
//! vault.encryptor.password=${CONFIG_VAULT_PASSWORD:changeme}
//! vault.encryptor.iterations=3
//! ```
//!
//! ```yaml
//! vault:
//!   encryptor:
//!     password: ${CONFIG_VAULT_PASSWORD}
//!     memory-cost: 65536
//! ```

use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config_file::{properties, ConfigFileKind};
use crate::crypto::{KeyDerivationParams, StringEncryptor};
use crate::error::{Result, VaultError};

/// Key prefix of encryptor settings in properties files
const PROPERTIES_PREFIX: &str = "vault.encryptor.";

/// Sibling files consulted when a file has no encryptor settings of its own
const FALLBACK_FILES: [&str; 2] = ["application.properties", "application.yml"];

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$\{([^}:]+)(?::([^}]*))?\}$").expect("valid placeholder pattern")
});

/// Encryptor settings read from a configuration file
#[derive(Clone, Default)]
pub struct EncryptorConfig {
    /// Password as written in the file, possibly an environment placeholder
    pub password: String,
    pub iterations: Option<u32>,
    pub memory_cost: Option<u32>,
    pub parallelism: Option<u32>,
}

impl std::fmt::Debug for EncryptorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptorConfig")
            .field("password", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .field("memory_cost", &self.memory_cost)
            .field("parallelism", &self.parallelism)
            .finish()
    }
}

impl EncryptorConfig {
    /// Read `vault.encryptor.*` keys; `None` if no password is configured
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Option<Self>> {
        let Some(password) = props.get(&format!("{}password", PROPERTIES_PREFIX)) else {
            return Ok(None);
        };

        let number = |key: &str| -> Result<Option<u32>> {
            props
                .get(&format!("{}{}", PROPERTIES_PREFIX, key))
                .map(|raw| parse_number(key, raw.trim()))
                .transpose()
        };

        Ok(Some(Self {
            password: password.clone(),
            iterations: number("iterations")?,
            memory_cost: number("memory-cost")?,
            parallelism: number("parallelism")?,
        }))
    }

    /// Read the `vault.encryptor` mapping; `None` if no password is configured
    pub fn from_yaml(document: &Value) -> Result<Option<Self>> {
        let Some(section) = document.get("vault").and_then(|v| v.get("encryptor")) else {
            return Ok(None);
        };

        let password = match section.get("password") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => {
                return Err(VaultError::Config(
                    "vault.encryptor.password must be a string".to_string(),
                ))
            }
        };

        let number = |key: &str| -> Result<Option<u32>> {
            match section.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::Number(n)) => n
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .map(Some)
                    .ok_or_else(|| invalid_number(key, &n.to_string())),
                Some(Value::String(s)) => parse_number(key, s.trim()).map(Some),
                Some(other) => Err(invalid_number(key, &format!("{:?}", other))),
            }
        };

        Ok(Some(Self {
            password,
            iterations: number("iterations")?,
            memory_cost: number("memory-cost")?,
            parallelism: number("parallelism")?,
        }))
    }

    /// Read the encryptor settings of a single file, if it has any
    pub async fn from_file(path: &Path) -> Result<Option<Self>> {
        let Some(kind) = ConfigFileKind::from_path(path) else {
            return Ok(None);
        };
        let content = tokio::fs::read_to_string(path).await?;

        match kind {
            ConfigFileKind::Properties => Self::from_properties(&properties::parse(&content)),
            ConfigFileKind::Yaml => Self::from_yaml_documents(path, &content),
        }
    }

    /// First `vault.encryptor` section across all documents of a YAML stream
    ///
    /// A file that does not parse is treated as having no settings.
    fn from_yaml_documents(path: &Path, content: &str) -> Result<Option<Self>> {
        for document in serde_yaml::Deserializer::from_str(content) {
            let document = match Value::deserialize(document) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Ignoring unparseable YAML in {:?}: {}", path, e);
                    return Ok(None);
                }
            };
            if let Some(config) = Self::from_yaml(&document)? {
                return Ok(Some(config));
            }
        }
        Ok(None)
    }

    /// Find the settings that apply to `path`
    ///
    /// Looks at the file itself, then `application.properties` and
    /// `application.yml` in the same directory.
    pub async fn locate(path: &Path) -> Result<Option<Self>> {
        if let Some(config) = Self::from_file(path).await? {
            return Ok(Some(config));
        }

        let Some(dir) = path.parent() else {
            return Ok(None);
        };

        for name in FALLBACK_FILES {
            let candidate = dir.join(name);
            if candidate == path || !candidate.is_file() {
                continue;
            }
            if let Some(config) = Self::from_file(&candidate).await? {
                debug!("Using encryptor settings from {:?} for {:?}", candidate, path);
                return Ok(Some(config));
            }
        }

        Ok(None)
    }

    /// Effective key derivation parameters, filling gaps from `defaults`
    pub fn params(&self, defaults: &KeyDerivationParams) -> KeyDerivationParams {
        KeyDerivationParams {
            memory_cost: self.memory_cost.unwrap_or(defaults.memory_cost),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            parallelism: self.parallelism.unwrap_or(defaults.parallelism),
        }
    }

    /// Build an encryptor, resolving the password from the environment
    pub fn encryptor(&self, defaults: &KeyDerivationParams) -> Result<StringEncryptor> {
        let password = Zeroizing::new(resolve_password(&self.password)?);
        StringEncryptor::new(password.as_str(), self.params(defaults))
    }
}

/// Resolve `${NAME}` / `${NAME:default}` against the process environment
pub fn resolve_password(raw: &str) -> Result<String> {
    resolve_password_with(raw, |name| std::env::var(name).ok())
}

/// Resolve `${NAME}` / `${NAME:default}` with a custom variable lookup
///
/// Anything that is not exactly a placeholder is returned unchanged.
pub fn resolve_password_with<F>(raw: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(captures) = ENV_PLACEHOLDER.captures(raw) else {
        return Ok(raw.to_string());
    };

    let name = &captures[1];
    lookup(name)
        .or_else(|| captures.get(2).map(|default| default.as_str().to_string()))
        .ok_or_else(|| VaultError::MissingEnvironmentVariable(name.to_string()))
}

fn parse_number(key: &str, raw: &str) -> Result<u32> {
    raw.parse::<u32>().map_err(|_| invalid_number(key, raw))
}

fn invalid_number(key: &str, raw: &str) -> VaultError {
    VaultError::Config(format!(
        "vault.encryptor.{} must be a non-negative integer, got {}",
        key, raw
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_literal_password() {
        assert_eq!(resolve_password_with("hunter2", |_| None).unwrap(), "hunter2");
        // Only an exact placeholder is resolved
        assert_eq!(
            resolve_password_with("pre-${X}", |_| Some("v".into())).unwrap(),
            "pre-${X}"
        );
    }

    #[test]
    fn test_resolve_from_environment() {
        let lookup = |name: &str| (name == "VAULT_PW").then(|| "from-env".to_string());

        assert_eq!(resolve_password_with("${VAULT_PW}", lookup).unwrap(), "from-env");
        assert_eq!(
            resolve_password_with("${VAULT_PW:fallback}", lookup).unwrap(),
            "from-env"
        );
    }

    #[test]
    fn test_resolve_default_value() {
        assert_eq!(
            resolve_password_with("${MISSING:fallback}", |_| None).unwrap(),
            "fallback"
        );
        assert_eq!(resolve_password_with("${MISSING:}", |_| None).unwrap(), "");
    }

    #[test]
    fn test_resolve_missing_variable() {
        let result = resolve_password_with("${MISSING}", |_| None);
        assert!(matches!(result, Err(VaultError::MissingEnvironmentVariable(name)) if name == "MISSING"));
    }

    #[test]
    fn test_from_properties() {
        let config = EncryptorConfig::from_properties(&props(&[
            ("vault.encryptor.password", "pw"),
            ("vault.encryptor.iterations", "2"),
            ("server.port", "8080"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.password, "pw");
        assert_eq!(config.iterations, Some(2));
        assert_eq!(config.memory_cost, None);

        let params = config.params(&KeyDerivationParams::default());
        assert_eq!(params.iterations, 2);
        assert_eq!(params.memory_cost, KeyDerivationParams::default().memory_cost);
    }

    #[test]
    fn test_from_properties_without_password() {
        let config = EncryptorConfig::from_properties(&props(&[("vault.encryptor.iterations", "2")]));
        assert!(config.unwrap().is_none());
    }

    #[test]
    fn test_from_properties_bad_number() {
        let result = EncryptorConfig::from_properties(&props(&[
            ("vault.encryptor.password", "pw"),
            ("vault.encryptor.parallelism", "four"),
        ]));
        assert!(matches!(result, Err(VaultError::Config(_))));
    }

    #[test]
    fn test_from_yaml() {
        let document: Value = serde_yaml::from_str(
            "vault:\n  encryptor:\n    password: pw\n    memory-cost: 2048\n    iterations: \"1\"\n",
        )
        .unwrap();

        let config = EncryptorConfig::from_yaml(&document).unwrap().unwrap();
        assert_eq!(config.password, "pw");
        assert_eq!(config.memory_cost, Some(2048));
        assert_eq!(config.iterations, Some(1));
        assert_eq!(config.parallelism, None);
    }

    #[test]
    fn test_from_yaml_without_section() {
        let document: Value = serde_yaml::from_str("server:\n  port: 8080\n").unwrap();
        assert!(EncryptorConfig::from_yaml(&document).unwrap().is_none());
    }

    #[test]
    fn test_from_yaml_negative_number() {
        let document: Value =
            serde_yaml::from_str("vault:\n  encryptor:\n    password: pw\n    iterations: -1\n")
                .unwrap();
        assert!(matches!(
            EncryptorConfig::from_yaml(&document),
            Err(VaultError::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = EncryptorConfig {
            password: "hunter2".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[tokio::test]
    async fn test_locate_prefers_own_file() {
        let temp_dir = TempDir::new().unwrap();
        let own = temp_dir.path().join("db.properties");
        std::fs::write(&own, "vault.encryptor.password=own\n").unwrap();
        std::fs::write(
            temp_dir.path().join("application.properties"),
            "vault.encryptor.password=shared\n",
        )
        .unwrap();

        let config = EncryptorConfig::locate(&own).await.unwrap().unwrap();
        assert_eq!(config.password, "own");
    }

    #[tokio::test]
    async fn test_locate_falls_back_to_siblings() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("db.properties");
        std::fs::write(&file, "db.password=ENC(secret)\n").unwrap();
        std::fs::write(
            temp_dir.path().join("application.yml"),
            "vault:\n  encryptor:\n    password: from-yaml\n",
        )
        .unwrap();

        let config = EncryptorConfig::locate(&file).await.unwrap().unwrap();
        assert_eq!(config.password, "from-yaml");
    }

    #[tokio::test]
    async fn test_locate_none() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("app.yml");
        std::fs::write(&file, "db:\n  password: ENC(x)\n").unwrap();

        assert!(EncryptorConfig::locate(&file).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_file_multi_document_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("application.yml");
        std::fs::write(
            &file,
            "spring:\n  profiles: default\n---\nvault:\n  encryptor:\n    password: prod-pw\n",
        )
        .unwrap();

        let config = EncryptorConfig::from_file(&file).await.unwrap().unwrap();
        assert_eq!(config.password, "prod-pw");
    }

    #[tokio::test]
    async fn test_from_file_unparseable_yaml_has_no_settings() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("broken.yaml");
        std::fs::write(&file, "vault: [unclosed\n").unwrap();

        assert!(EncryptorConfig::from_file(&file).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_file_empty_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("empty.yml");
        std::fs::write(&file, "").unwrap();

        assert!(EncryptorConfig::from_file(&file).await.unwrap().is_none());
    }
}
