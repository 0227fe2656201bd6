//! Secret entry type definitions

use serde::{Deserialize, Serialize};

/// A named configuration value, optionally stored in sealed form
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    /// Unique name (e.g., "db.password")
    pub name: String,

    /// Sealed bytes when `is_encrypted`, raw value bytes otherwise
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,

    /// Whether `ciphertext` is a sealed value
    pub is_encrypted: bool,
}

impl SecretEntry {
    /// Create an entry holding a raw, unencrypted value
    pub fn plain(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            ciphertext: value.into(),
            is_encrypted: false,
        }
    }

    /// Create an entry from an already sealed value
    pub fn sealed(name: impl Into<String>, sealed: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            ciphertext: sealed,
            is_encrypted: true,
        }
    }
}

impl std::fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEntry")
            .field("name", &self.name)
            .field("ciphertext", &format_args!("[{} bytes]", self.ciphertext.len()))
            .field("is_encrypted", &self.is_encrypted)
            .finish()
    }
}

/// Serde adapter storing bytes as standard base64 text
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
