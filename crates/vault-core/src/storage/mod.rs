//! Storage backends for persisting secret entries
//!
//! Persistence sits outside the secret store: the store snapshots its entries
//! into an [`EntryStorage`] and loads them back through the same trait.

mod json_file;
mod traits;

pub use json_file::JsonFileStorage;
pub use traits::EntryStorage;
