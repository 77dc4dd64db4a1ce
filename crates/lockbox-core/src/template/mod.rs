//! Placeholder substitution over a resource tree.
//!
//! Walks the configured resource root, selects regular files whose full path
//! matches the resource pattern, and rewrites `@@vault...@@` placeholder
//! tokens with decrypted vault values. Tokens with no vault entry are never
//! errors: they stay verbatim in the output and are collected into the
//! missing-secrets report for a later `add-missing` import.
//!
//! Every matched file is rewritten, resolved tokens or not, so a processing
//! run is idempotent over already-substituted trees.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, instrument};
use walkdir::WalkDir;

use crate::vault::store::{REPORT_SEPARATOR, VaultError, VaultStore, write_atomic};

/// Delimiter around placeholder tokens in resource files.
pub const TOKEN_DELIMITER: &str = "@@";

/// Prefix a delimited token must carry to count as a placeholder.
pub const TOKEN_PREFIX: &str = "vault";

/// Value column written for each unresolved token in the report.
pub const REPORT_FILLER: &str = "fill_me";

/// Errors that can occur during template processing.
///
/// Note what is absent: an unresolved token is not an error, it is part of
/// the [`ProcessSummary`].
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The configured resource pattern is not a valid regex.
    #[error("invalid resource pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The resource root does not exist or is not a directory.
    #[error("resource path {0} is not a directory")]
    RootNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Outcome of one processing run.
#[derive(Debug, Default)]
pub struct ProcessSummary {
    /// Files whose path matched the resource pattern (all were rewritten).
    pub files_processed: usize,
    /// Token occurrences replaced with vault values.
    pub replaced: usize,
    /// Distinct unresolved tokens, sorted. Non-empty means the report file
    /// was written.
    pub missing: Vec<String>,
}

/// Rewrites placeholder tokens in resource files from vault content.
///
/// Borrows the store: the processor resolves token-by-token through
/// [`VaultStore::resolve`], so values stay encrypted until the moment they
/// are substituted.
pub struct TemplateProcessor<'a> {
    store: &'a VaultStore,
}

impl<'a> TemplateProcessor<'a> {
    pub fn new(store: &'a VaultStore) -> Self {
        Self { store }
    }

    /// Process every matching file under the configured resource root.
    #[instrument(skip_all, fields(root = %self.store.config().resource_path.display()))]
    pub fn process(&self) -> Result<ProcessSummary, TemplateError> {
        self.store.assert_access()?;

        let config = self.store.config();
        // Full match, not substring: anchor the configured pattern
        let pattern = Regex::new(&format!(r"\A(?:{})\z", config.resource_pattern))?;
        let root = &config.resource_path;
        if !root.is_dir() {
            return Err(TemplateError::RootNotFound(root.clone()));
        }

        let mut summary = ProcessSummary::default();
        let mut missing = BTreeSet::new();

        for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path().to_string_lossy();
            if !pattern.is_match(&path) {
                continue;
            }
            debug!(file = %entry.path().display(), "processing resource file");
            summary.replaced += self.process_file(entry.path(), &mut missing)?;
            summary.files_processed += 1;
        }

        if !missing.is_empty() {
            let report: String = missing
                .iter()
                .map(|token| format!("{token}{REPORT_SEPARATOR}{REPORT_FILLER}\n"))
                .collect();
            write_atomic(&config.missing_secrets_file, &report)?;
        }
        summary.missing = missing.into_iter().collect();
        Ok(summary)
    }

    fn process_file(
        &self,
        path: &Path,
        missing: &mut BTreeSet<String>,
    ) -> Result<usize, TemplateError> {
        let content = std::fs::read_to_string(path)?;
        let mut replaced = 0;
        let mut output = String::with_capacity(content.len());
        for line in content.lines() {
            output.push_str(&self.process_line(line, missing, &mut replaced)?);
            output.push('\n');
        }
        write_atomic(path, &output)?;
        Ok(replaced)
    }

    fn process_line(
        &self,
        line: &str,
        missing: &mut BTreeSet<String>,
        replaced: &mut usize,
    ) -> Result<String, TemplateError> {
        if !line.contains(TOKEN_DELIMITER) {
            return Ok(line.to_owned());
        }

        let mut output = line.to_owned();
        for token in line
            .split(TOKEN_DELIMITER)
            .filter(|token| token.starts_with(TOKEN_PREFIX))
        {
            match self.store.resolve(token)? {
                Some(value) => {
                    let delimited = format!("{TOKEN_DELIMITER}{token}{TOKEN_DELIMITER}");
                    *replaced += output.matches(&delimited).count();
                    output = output.replace(&delimited, &value);
                }
                None => {
                    error!(token, "no value in vault");
                    missing.insert(token.to_owned());
                }
            }
        }
        Ok(output)
    }
}
