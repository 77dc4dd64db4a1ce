pub mod config;
pub mod crypto;
pub mod error;
pub mod template;
pub mod vault;

pub use config::VaultConfig;
pub use template::TemplateProcessor;
pub use vault::VaultStore;
