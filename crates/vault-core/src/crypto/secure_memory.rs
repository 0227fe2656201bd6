//! Key material and plaintext wrappers that wipe themselves on drop

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};

/// Length of a derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Key material derived from a passphrase - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Create a derived key from raw bytes
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Raw key bytes for the cipher
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Plaintext of a secret, zeroed on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes {
    value: Vec<u8>,
}

impl SecretBytes {
    /// Wrap plaintext bytes
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Get the secret bytes (use carefully)
    pub fn expose(&self) -> &[u8] {
        &self.value
    }

    /// View the secret as UTF-8 text
    pub fn to_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.value)
            .map_err(|e| VaultError::Decryption(format!("Invalid UTF-8: {}", e)))
    }

    /// Consume and return the inner bytes
    pub fn into_inner(mut self) -> Vec<u8> {
        std::mem::take(&mut self.value)
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBytes")
            .field("value", &"[REDACTED]")
            .finish()
    }
}
