//! Passphrase resolution.
//!
//! The passphrase is resolved exactly once, when the store opens, and held
//! in memory for every cipher operation after that. Sources in priority
//! order: the `VAULT_PASSPHRASE` environment variable, then the passphrase
//! file (UTF-8 text, lines concatenated with no separator).
//!
//! Resolution never fails. When neither source yields anything the
//! passphrase is simply empty, so an access check against an uninitialized
//! vault reports a clean denial instead of crashing on "no passphrase".

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::VaultConfig;

/// Environment variable consulted before the passphrase file.
pub const PASSPHRASE_ENV: &str = "VAULT_PASSPHRASE";

/// The resolved vault passphrase. `Debug` is redacted.
#[derive(Debug)]
pub struct Passphrase {
    inner: SecretString,
}

impl Passphrase {
    /// Resolve the passphrase from the environment, falling back to the
    /// configured passphrase file.
    pub fn resolve(config: &VaultConfig) -> Self {
        Self::resolve_from(
            std::env::var(PASSPHRASE_ENV).ok(),
            &config.passphrase_file,
        )
    }

    /// Resolution given an already-read environment value. Separated from
    /// [`Passphrase::resolve`] so the precedence chain is testable without
    /// touching process environment.
    fn resolve_from(env_value: Option<String>, passphrase_file: &Path) -> Self {
        if let Some(value) = env_value.filter(|v| !v.is_empty()) {
            debug!("passphrase resolved from {PASSPHRASE_ENV}");
            return Self::from(value);
        }

        match std::fs::read_to_string(passphrase_file) {
            Ok(content) => {
                debug!(file = %passphrase_file.display(), "passphrase resolved from file");
                Self::from(content.lines().collect::<String>())
            }
            Err(err) => {
                debug!(file = %passphrase_file.display(), %err, "no passphrase source found");
                Self::from(String::new())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }

    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }
}

impl From<String> for Passphrase {
    fn from(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }
}
