//! Secret store for named configuration values

mod manager;
mod types;

pub use manager::SecretStore;
pub use types::SecretEntry;
