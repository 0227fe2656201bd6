//! Configuration files carrying `ENC(...)` placeholders
//!
//! Supported formats are `.properties`, `.yml` and `.yaml`. Placeholders are
//! toggled in the raw text, so comments and layout survive a rewrite.

mod placeholder;
mod processor;
pub mod properties;

use std::path::Path;

pub use placeholder::{count_placeholders, toggle_placeholders, ToggleOutcome};
pub use processor::{ConfigProcessor, ProcessReport};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFileKind {
    Properties,
    Yaml,
}

impl ConfigFileKind {
    /// Detect the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "properties" => Some(Self::Properties),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}
