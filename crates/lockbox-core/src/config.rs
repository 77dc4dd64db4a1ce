//! Runtime configuration for vault and template operations.

use std::path::PathBuf;

/// Default location of the encrypted vault blob.
pub const DEFAULT_VAULT_FILE: &str = ".vault";

/// Default fallback passphrase source, consulted after `VAULT_PASSPHRASE`.
pub const DEFAULT_PASSPHRASE_FILE: &str = ".vault_passphrase";

/// Default root directory scanned for template substitution.
pub const DEFAULT_RESOURCE_PATH: &str = "build";

/// Default full-match pattern selecting resource files to process.
pub const DEFAULT_RESOURCE_PATTERN: &str = r".*/conf/.*\.properties";

/// Default location of the missing-secrets report.
pub const DEFAULT_MISSING_SECRETS_FILE: &str = ".vault_missing_secrets";

/// Paths and patterns a [`VaultStore`](crate::VaultStore) operates on.
///
/// All fields default to the conventional dotfile locations in the working
/// directory; override them with the `with_*` builders.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Path to the encrypted vault blob.
    pub vault_file: PathBuf,
    /// Fallback passphrase source (the `VAULT_PASSPHRASE` env var wins).
    pub passphrase_file: PathBuf,
    /// Root directory scanned for template substitution.
    pub resource_path: PathBuf,
    /// Full-match regex selecting files to process under `resource_path`.
    pub resource_pattern: String,
    /// Path of the missing-secrets report.
    pub missing_secrets_file: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            vault_file: PathBuf::from(DEFAULT_VAULT_FILE),
            passphrase_file: PathBuf::from(DEFAULT_PASSPHRASE_FILE),
            resource_path: PathBuf::from(DEFAULT_RESOURCE_PATH),
            resource_pattern: DEFAULT_RESOURCE_PATTERN.to_owned(),
            missing_secrets_file: PathBuf::from(DEFAULT_MISSING_SECRETS_FILE),
        }
    }
}

impl VaultConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vault_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.vault_file = path.into();
        self
    }

    pub fn with_passphrase_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.passphrase_file = path.into();
        self
    }

    pub fn with_resource_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.resource_path = path.into();
        self
    }

    pub fn with_resource_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.resource_pattern = pattern.into();
        self
    }

    pub fn with_missing_secrets_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.missing_secrets_file = path.into();
        self
    }
}
