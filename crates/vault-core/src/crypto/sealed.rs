//! Passphrase-sealed values
//!
//! A sealed value carries everything needed to decrypt it except the
//! passphrase:
//!
//! `{version}{memory_cost}{iterations}{parallelism}{salt}{iv}{ciphertext}{auth_tag}`
//!
//! The three cost parameters are little-endian `u32`s, so a value stays
//! readable after the configured key derivation cost changes.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::encryption::{self, IV_LEN, TAG_LEN};
use super::key_derivation::{derive_key, generate_salt, KeyDerivationParams, SALT_LEN};
use crate::error::{Result, VaultError};

/// Format version written as the first byte of every sealed value
pub const SEALED_VERSION: u8 = 2;

/// Length of the encoded key derivation parameters
const PARAMS_LEN: usize = 12;

/// Bytes before the AES-GCM output
const HEADER_LEN: usize = 1 + PARAMS_LEN + SALT_LEN;

/// Smallest possible sealed value (empty plaintext)
pub const MIN_SEALED_LEN: usize = HEADER_LEN + IV_LEN + TAG_LEN;

/// Largest recorded parameters [`open`] will derive with
const MAX_MEMORY_COST: u32 = 4 * 1024 * 1024;
const MAX_ITERATIONS: u32 = 64;
const MAX_PARALLELISM: u32 = 64;

/// Encrypt `plaintext` under a key derived from `passphrase` and a fresh salt
///
/// `params` is recorded in the output and reused by [`open`].
pub fn seal(plaintext: &[u8], passphrase: &str, params: &KeyDerivationParams) -> Result<Vec<u8>> {
    let salt = generate_salt();
    let key = derive_key(passphrase, &salt, params)?;
    let ciphertext = encryption::encrypt(plaintext, &key)?;

    let mut sealed = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    sealed.push(SEALED_VERSION);
    sealed.extend_from_slice(&params.memory_cost.to_le_bytes());
    sealed.extend_from_slice(&params.iterations.to_le_bytes());
    sealed.extend_from_slice(&params.parallelism.to_le_bytes());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a value produced by [`seal`] with the parameters it records
///
/// Any failure, including an empty passphrase, is a [`VaultError::Decryption`].
pub fn open(sealed: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let params = sealed_params(sealed)
        .ok_or_else(|| VaultError::Decryption("Malformed sealed value".to_string()))?;

    if passphrase.is_empty() {
        return Err(VaultError::Decryption("Passphrase required".to_string()));
    }
    if params.memory_cost > MAX_MEMORY_COST
        || params.iterations > MAX_ITERATIONS
        || params.parallelism > MAX_PARALLELISM
    {
        return Err(VaultError::Decryption(format!(
            "Unsupported key derivation parameters: {:?}",
            params
        )));
    }

    let salt = &sealed[1 + PARAMS_LEN..HEADER_LEN];
    let key = derive_key(passphrase, salt, &params)
        .map_err(|e| VaultError::Decryption(e.to_string()))?;
    encryption::decrypt(&sealed[HEADER_LEN..], &key)
}

/// Key derivation parameters recorded in a sealed value
pub fn sealed_params(sealed: &[u8]) -> Option<KeyDerivationParams> {
    if !is_sealed(sealed) {
        return None;
    }
    let field = |index: usize| {
        let start = 1 + 4 * index;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&sealed[start..start + 4]);
        u32::from_le_bytes(bytes)
    };
    Some(KeyDerivationParams {
        memory_cost: field(0),
        iterations: field(1),
        parallelism: field(2),
    })
}

/// Structural check: version byte and minimum length
pub fn is_sealed(bytes: &[u8]) -> bool {
    bytes.len() >= MIN_SEALED_LEN && bytes[0] == SEALED_VERSION
}

/// Text encryptor bound to one passphrase, producing base64 sealed values
#[derive(Clone)]
pub struct StringEncryptor {
    passphrase: String,
    params: KeyDerivationParams,
}

impl StringEncryptor {
    /// Create an encryptor; fails if the passphrase is empty
    pub fn new(passphrase: impl Into<String>, params: KeyDerivationParams) -> Result<Self> {
        let passphrase = passphrase.into();
        if passphrase.is_empty() {
            return Err(VaultError::InvalidInput(
                "Passphrase must not be empty".to_string(),
            ));
        }
        Ok(Self { passphrase, params })
    }

    /// Key derivation parameters for newly sealed values
    pub fn params(&self) -> &KeyDerivationParams {
        &self.params
    }

    /// Seal `plaintext` and return it base64 encoded
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let sealed = seal(plaintext.as_bytes(), &self.passphrase, &self.params)?;
        Ok(STANDARD.encode(sealed))
    }

    /// Decode and open a base64 sealed value
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let sealed = decode_sealed(encoded)
            .ok_or_else(|| VaultError::Decryption("Not a sealed value".to_string()))?;
        let plaintext = open(&sealed, &self.passphrase)?;
        String::from_utf8(plaintext)
            .map_err(|e| VaultError::Decryption(format!("Invalid UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for StringEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringEncryptor")
            .field("passphrase", &"[REDACTED]")
            .field("params", &self.params)
            .finish()
    }
}

/// Decode base64 text that holds a structurally valid sealed value
pub fn decode_sealed(encoded: &str) -> Option<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .ok()
        .filter(|bytes| is_sealed(bytes))
}

impl Drop for StringEncryptor {
    fn drop(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.passphrase);
    }
}
