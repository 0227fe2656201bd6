//! Interactive passphrase entry

use anyhow::{bail, Result};
use zeroize::Zeroizing;

/// Use the provided passphrase, or prompt for one on the terminal
pub fn passphrase(provided: Option<&str>, prompt: &str) -> Result<Zeroizing<String>> {
    let value = match provided {
        Some(value) => Zeroizing::new(value.to_string()),
        None => Zeroizing::new(rpassword::prompt_password(prompt)?),
    };
    check_not_empty(value)
}

/// Like [`passphrase`], but a prompted passphrase must be typed twice
pub fn new_passphrase(provided: Option<&str>) -> Result<Zeroizing<String>> {
    if provided.is_some() {
        return passphrase(provided, "");
    }

    let first = passphrase(None, "New passphrase: ")?;
    let second = Zeroizing::new(rpassword::prompt_password("Repeat new passphrase: ")?);
    confirm(first, &second)
}

fn check_not_empty(value: Zeroizing<String>) -> Result<Zeroizing<String>> {
    if value.is_empty() {
        bail!("Passphrase cannot be empty");
    }
    Ok(value)
}

fn confirm(first: Zeroizing<String>, second: &str) -> Result<Zeroizing<String>> {
    if first.as_str() != second {
        bail!("Passphrases do not match");
    }
    Ok(first)
}
