//! Error types for the lockbox crate
//!
//! This module re-exports all error types so callers can match on any
//! failure without reaching into individual modules.

// Re-export error types from submodules
pub use crate::crypto::CryptoError;
pub use crate::template::TemplateError;
pub use crate::vault::store::VaultError;
