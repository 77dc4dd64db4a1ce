//! Encrypted key-value store bound to a single passphrase.
//!
//! # Vault file format
//!
//! One record per secret, identifier and value each encrypted separately:
//!
//! ```text
//! <identifier ciphertext>---<value ciphertext>
//! ```
//!
//! Records are newline-joined in lexicographic order of the identifier
//! ciphertext (the map's native order, which makes rewrites deterministic),
//! and the whole sequence is encoded as a single Base64 blob on one physical
//! line. One reserved record doubles as the access check: its key is the
//! encryption of the passphrase itself, its value the encryption of the
//! format version string. Verifying access is recomputing both and looking
//! the pair up - the passphrase itself is never persisted.
//!
//! Every mutation loads fresh state at open, mutates the in-memory map, and
//! rewrites the whole file through a temp file and an atomic rename. There
//! is no partial update path and no cross-process locking; one operator,
//! one machine.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use subtle::ConstantTimeEq;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::VaultConfig;
use crate::crypto::{Cipher, CryptoError};
use crate::vault::passphrase::Passphrase;

/// Format version recorded in the reserved access-check entry.
pub const FORMAT_VERSION: &str = "V1.0";

/// Separator between the identifier and value ciphertexts of a record.
const RECORD_SEPARATOR: &str = "---";

/// Separator of missing-secrets report records (`identifier;value`).
pub const REPORT_SEPARATOR: char = ';';

/// Errors that can occur operating on a vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Vault creation was attempted without a resolvable passphrase.
    #[error("no passphrase available - set VAULT_PASSPHRASE or create a passphrase file")]
    MissingPassphrase,

    /// Vault creation was attempted over an existing vault file.
    #[error("vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    /// The reserved record does not match the resolved passphrase. Covers
    /// the wrong-passphrase case and the not-yet-created vault alike.
    #[error("vault access denied - wrong passphrase or uninitialized vault")]
    AccessDenied,

    /// Reveal was asked for an identifier the vault does not hold.
    #[error("no secret named {0:?} in the vault")]
    SecretNotFound(String),

    /// The missing-secrets report is absent or empty.
    #[error("no missing secrets to import from {0}")]
    NoMissingSecrets(PathBuf),

    /// A report line did not split into exactly `identifier;value`.
    #[error("malformed report line {0:?} - expected identifier;value")]
    MalformedReportLine(String),

    /// The vault file exists but is not a Base64 blob of UTF-8 records.
    #[error("vault file {0} is not a valid vault blob")]
    MalformedVaultFile(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// A vault opened for one task invocation.
///
/// Opening resolves the passphrase once and loads the current vault content;
/// entries stay encrypted at rest in the map and are only decrypted on
/// demand. Every operation except [`VaultStore::create`] re-verifies access
/// from scratch - the check is recomputed, never cached.
pub struct VaultStore {
    config: VaultConfig,
    passphrase: Passphrase,
    cipher: Cipher,
    entries: BTreeMap<String, String>,
}

impl VaultStore {
    /// Open a vault, resolving the passphrase from the environment or the
    /// configured passphrase file.
    ///
    /// A missing vault file is not an error - the store just starts empty,
    /// which is the state `create` expects and every other operation
    /// rejects through the access check.
    #[instrument(skip_all, fields(vault = %config.vault_file.display()))]
    pub fn open(config: VaultConfig) -> Result<Self, VaultError> {
        let passphrase = Passphrase::resolve(&config);
        Self::open_with(config, passphrase)
    }

    /// Open a vault with an already-resolved passphrase.
    pub fn open_with(config: VaultConfig, passphrase: Passphrase) -> Result<Self, VaultError> {
        let cipher = Cipher::new(passphrase.expose());
        let entries = load_vault_content(&config.vault_file)?;
        Ok(Self {
            config,
            passphrase,
            cipher,
            entries,
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Create a brand-new vault file holding only the reserved access-check
    /// record.
    #[instrument(skip_all)]
    pub fn create(&mut self) -> Result<(), VaultError> {
        if self.passphrase.is_empty() {
            return Err(VaultError::MissingPassphrase);
        }
        if self.config.vault_file.exists() {
            return Err(VaultError::VaultAlreadyExists(self.config.vault_file.clone()));
        }

        let mut entries = BTreeMap::new();
        entries.insert(
            self.cipher.encrypt(self.passphrase.expose()),
            self.cipher.encrypt(FORMAT_VERSION),
        );
        write_vault_file(&self.config.vault_file, &entries)?;
        self.entries = entries;
        debug!(vault = %self.config.vault_file.display(), "vault created");
        Ok(())
    }

    /// Verify the resolved passphrase against the reserved record.
    ///
    /// Succeeds iff the vault was created with the passphrase currently
    /// resolved; an empty vault denies access like any other mismatch.
    pub fn assert_access(&self) -> Result<(), VaultError> {
        let key = self.cipher.encrypt(self.passphrase.expose());
        let version = self.cipher.encrypt(FORMAT_VERSION);
        match self.entries.get(&key) {
            Some(stored) if bool::from(stored.as_bytes().ct_eq(version.as_bytes())) => Ok(()),
            _ => Err(VaultError::AccessDenied),
        }
    }

    /// Add or overwrite a secret and rewrite the vault file.
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub fn add_secret(&mut self, identifier: &str, value: &str) -> Result<(), VaultError> {
        self.assert_access()?;
        self.insert(identifier, value);
        self.save()
    }

    /// Bulk-import every `identifier;value` line of the missing-secrets
    /// report. Returns the number of secrets imported.
    ///
    /// All lines are validated before any is applied: one malformed line
    /// fails the whole operation and leaves the vault untouched. The report
    /// file itself is kept; deleting it is the operator's call.
    #[instrument(skip_all, fields(report = %self.config.missing_secrets_file.display()))]
    pub fn add_missing_secrets(&mut self) -> Result<usize, VaultError> {
        self.assert_access()?;

        let report = &self.config.missing_secrets_file;
        let content = std::fs::read_to_string(report).unwrap_or_default();
        if content.lines().next().is_none() {
            return Err(VaultError::NoMissingSecrets(report.clone()));
        }

        let mut pairs = Vec::new();
        for line in content.lines() {
            let tokens: Vec<&str> = line.split(REPORT_SEPARATOR).collect();
            match tokens.as_slice() {
                [identifier, value] => pairs.push(((*identifier).to_owned(), (*value).to_owned())),
                _ => return Err(VaultError::MalformedReportLine(line.to_owned())),
            }
        }

        let count = pairs.len();
        for (identifier, value) in &pairs {
            self.insert(identifier, value);
        }
        self.save()?;
        Ok(count)
    }

    /// Remove a secret and rewrite the vault file. Removing an absent
    /// identifier is a no-op (the file is still rewritten).
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub fn remove_secret(&mut self, identifier: &str) -> Result<(), VaultError> {
        self.assert_access()?;
        let key = self.cipher.encrypt(identifier);
        if self.entries.remove(&key).is_none() {
            debug!(identifier, "no such secret to remove");
        }
        self.save()
    }

    /// Decrypt and return a secret's value.
    #[instrument(skip_all, fields(identifier = %identifier))]
    pub fn reveal_secret(&self, identifier: &str) -> Result<String, VaultError> {
        self.assert_access()?;
        self.resolve(identifier)?
            .ok_or_else(|| VaultError::SecretNotFound(identifier.to_owned()))
    }

    /// Encrypt-lookup-decrypt without the not-found error - the per-token
    /// primitive the template processor drives. Does NOT run the access
    /// check; callers on the public surface do.
    pub fn resolve(&self, identifier: &str) -> Result<Option<String>, VaultError> {
        let key = self.cipher.encrypt(identifier);
        match self.entries.get(&key) {
            Some(value) => Ok(Some(self.cipher.decrypt(value)?)),
            None => Ok(None),
        }
    }

    /// Decrypt and return all secret identifiers, sorted. The reserved
    /// access-check record is excluded.
    pub fn list_secrets(&self) -> Result<Vec<String>, VaultError> {
        self.assert_access()?;
        let reserved = self.cipher.encrypt(self.passphrase.expose());

        let mut identifiers = Vec::with_capacity(self.entries.len().saturating_sub(1));
        for key in self.entries.keys() {
            if *key == reserved {
                continue;
            }
            identifiers.push(self.cipher.decrypt(key)?);
        }
        identifiers.sort();
        Ok(identifiers)
    }

    fn insert(&mut self, identifier: &str, value: &str) {
        self.entries
            .insert(self.cipher.encrypt(identifier), self.cipher.encrypt(value));
    }

    fn save(&self) -> Result<(), VaultError> {
        write_vault_file(&self.config.vault_file, &self.entries)
    }
}

fn load_vault_content(path: &Path) -> Result<BTreeMap<String, String>, VaultError> {
    let blob = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            debug!(vault = %path.display(), %err, "no vault content loaded");
            return Ok(BTreeMap::new());
        }
    };
    let Some(line) = blob.lines().next() else {
        return Ok(BTreeMap::new());
    };

    let decoded = BASE64
        .decode(line.trim())
        .map_err(|_| VaultError::MalformedVaultFile(path.to_path_buf()))?;
    let records = String::from_utf8(decoded)
        .map_err(|_| VaultError::MalformedVaultFile(path.to_path_buf()))?;

    let mut entries = BTreeMap::new();
    for record in records.lines() {
        let tokens: Vec<&str> = record.split(RECORD_SEPARATOR).collect();
        match tokens.as_slice() {
            [key, value] => {
                entries.insert((*key).to_owned(), (*value).to_owned());
            }
            // Malformed records are tolerated, not reported
            _ => debug!(record, "discarding malformed vault record"),
        }
    }
    Ok(entries)
}

fn write_vault_file(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), VaultError> {
    let records: Vec<String> = entries
        .iter()
        .map(|(key, value)| format!("{key}{RECORD_SEPARATOR}{value}"))
        .collect();
    let mut blob = BASE64.encode(records.join("\n"));
    blob.push('\n');
    write_atomic(path, &blob)?;
    Ok(())
}

/// Write a file through a sibling temp file and an atomic rename, so a crash
/// mid-write leaves either the old content or the new, never a torn file.
pub(crate) fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
