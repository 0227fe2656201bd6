//! `ENC(...)` placeholder toggling

use regex::Regex;
use std::sync::LazyLock;

use crate::crypto::{decode_sealed, StringEncryptor};
use crate::error::Result;

static ENC_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ENC\((.*?)\)").expect("valid placeholder pattern"));

/// Result of toggling the placeholders in one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Rewritten document
    pub content: String,
    /// Plaintext values that were wrapped into `ENC(<sealed>)`
    pub encrypted: usize,
    /// Sealed values that were replaced by their plaintext
    pub decrypted: usize,
}

/// Flip every `ENC(...)` placeholder in `content`
///
/// A placeholder holding a sealed value is replaced by its plaintext; any
/// other placeholder content is treated as plaintext and sealed. A sealed
/// value that fails to open aborts the whole document with the decryption
/// error. Returns `None` if the document has no placeholders.
pub fn toggle_placeholders(
    content: &str,
    encryptor: &StringEncryptor,
) -> Result<Option<ToggleOutcome>> {
    let mut output = String::with_capacity(content.len());
    let mut encrypted = 0;
    let mut decrypted = 0;
    let mut last_end = 0;

    for placeholder in ENC_PLACEHOLDER.find_iter(content) {
        let matched = placeholder.as_str();
        let inner = &matched[4..matched.len() - 1];

        output.push_str(&content[last_end..placeholder.start()]);

        if decode_sealed(inner).is_some() {
            output.push_str(&encryptor.decrypt(inner)?);
            decrypted += 1;
        } else {
            output.push_str("ENC(");
            output.push_str(&encryptor.encrypt(inner)?);
            output.push(')');
            encrypted += 1;
        }

        last_end = placeholder.end();
    }

    if encrypted + decrypted == 0 {
        return Ok(None);
    }

    output.push_str(&content[last_end..]);
    Ok(Some(ToggleOutcome {
        content: output,
        encrypted,
        decrypted,
    }))
}

/// Count `ENC(...)` placeholders without touching them
pub fn count_placeholders(content: &str) -> usize {
    ENC_PLACEHOLDER.find_iter(content).count()
}
