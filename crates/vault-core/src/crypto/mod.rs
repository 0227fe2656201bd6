//! Cryptographic primitives for secret configuration values
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption with a random IV per call
//! - Argon2id key derivation from passphrases
//! - Self-contained sealed values (salt + IV + ciphertext)
//! - Secure memory handling with zeroize

mod encryption;
mod key_derivation;
mod sealed;
mod secure_memory;

pub use encryption::{decrypt, encrypt, EncryptedData, IV_LEN, TAG_LEN};
pub use key_derivation::{derive_key, generate_salt, KeyDerivationParams, MIN_SALT_LEN, SALT_LEN};
pub use sealed::{
    decode_sealed, is_sealed, open, seal, sealed_params, StringEncryptor, MIN_SEALED_LEN,
    SEALED_VERSION,
};
pub use secure_memory::{DerivedKey, SecretBytes, KEY_LEN};
