//! Vault-level abstractions and operations

pub mod passphrase;
pub mod store;

// Re-export commonly used types
pub use passphrase::{PASSPHRASE_ENV, Passphrase};
pub use store::{FORMAT_VERSION, REPORT_SEPARATOR, VaultError, VaultStore};
