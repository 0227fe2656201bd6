//! Password-based key derivation using Argon2id

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use super::secure_memory::{DerivedKey, KEY_LEN};
use crate::error::{Result, VaultError};

/// Minimum accepted salt length in bytes
pub const MIN_SALT_LEN: usize = 8;

/// Length of salts produced by [`generate_salt`]
pub const SALT_LEN: usize = 16;

/// Parameters for Argon2id key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 65536 = 64MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 3)
    pub iterations: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit key from a passphrase using Argon2id
///
/// # Arguments
/// * `passphrase` - The user's passphrase (must not be empty)
/// * `salt` - At least [`MIN_SALT_LEN`] bytes (use `generate_salt()` to create one)
/// * `params` - Cost parameters; `iterations` must be at least 1
///
/// # Returns
/// A 32-byte key suitable for AES-256 encryption
pub fn derive_key(
    passphrase: &str,
    salt: &[u8],
    params: &KeyDerivationParams,
) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        return Err(VaultError::InvalidInput(
            "Passphrase must not be empty".to_string(),
        ));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(VaultError::InvalidInput(format!(
            "Salt too short: expected at least {} bytes, got {}",
            MIN_SALT_LEN,
            salt.len()
        )));
    }
    if params.iterations == 0 {
        return Err(VaultError::InvalidInput(
            "Iterations must be at least 1".to_string(),
        ));
    }

    let argon2_params = Params::new(
        params.memory_cost,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| VaultError::InvalidInput(format!("Invalid key derivation parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_LEN];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key_bytes)
        .map_err(|e| VaultError::InvalidInput(format!("Key derivation failed: {}", e)))?;

    let key = DerivedKey::new(key_bytes);
    zeroize::Zeroize::zeroize(&mut key_bytes);
    Ok(key)
}
