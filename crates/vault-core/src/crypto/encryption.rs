//! AES-256-GCM authenticated encryption
//!
//! Ciphertext format: `{iv}{ciphertext}{auth_tag}` as raw bytes
//! - IV: 12 bytes (96 bits) - standard for GCM, fresh for every call
//! - Ciphertext: same length as the plaintext
//! - Auth tag: 16 bytes (128 bits)

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::secure_memory::DerivedKey;
use crate::error::{Result, VaultError};

/// IV length for AES-GCM
pub const IV_LEN: usize = 12;

/// Authentication tag length for AES-GCM
pub const TAG_LEN: usize = 16;

/// Encrypted data split into its IV and the tagged ciphertext
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    /// Initialization vector (12 bytes for GCM)
    pub iv: [u8; IV_LEN],
    /// Ciphertext with the auth tag appended
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Parse from `{iv}{ciphertext}{auth_tag}`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < IV_LEN + TAG_LEN {
            return Err(VaultError::Decryption(format!(
                "Ciphertext truncated: expected at least {} bytes, got {}",
                IV_LEN + TAG_LEN,
                bytes.len()
            )));
        }

        let (iv_bytes, ciphertext) = bytes.split_at(IV_LEN);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(iv_bytes);

        Ok(Self {
            iv,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Serialize as `{iv}{ciphertext}{auth_tag}`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(IV_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out
    }
}

/// Encrypt plaintext using AES-256-GCM
///
/// A random IV is generated for every call and prepended to the output,
/// so encrypting the same plaintext twice never yields the same bytes.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    Ok(EncryptedData { iv, ciphertext }.to_bytes())
}

/// Decrypt `{iv}{ciphertext}{auth_tag}` using AES-256-GCM
///
/// Fails with [`VaultError::Decryption`] if the input is truncated or the
/// authentication check fails (wrong key or tampered data).
pub fn decrypt(ciphertext: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let encrypted = EncryptedData::from_bytes(ciphertext)?;

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Decryption(e.to_string()))?;

    let nonce = Nonce::from_slice(&encrypted.iv);

    cipher
        .decrypt(nonce, encrypted.ciphertext.as_slice())
        .map_err(|_| VaultError::Decryption("Authentication failed".to_string()))
}
