//! Storage trait definitions

use crate::error::Result;
use crate::store::SecretEntry;
use async_trait::async_trait;

/// Trait for persistence backends holding secret entries
///
/// Entries are stored exactly as the store holds them; encrypted entries stay
/// sealed, so backends never see plaintext of sensitive values.
#[async_trait]
pub trait EntryStorage: Send + Sync {
    /// Load all persisted entries (empty if nothing has been saved yet)
    async fn load_entries(&self) -> Result<Vec<SecretEntry>>;

    /// Replace the persisted entries with `entries`
    async fn save_entries(&self, entries: &[SecretEntry]) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
