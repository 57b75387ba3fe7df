//! Workspace error type.
//!
//! Sub-crates define their own error enums and either convert them into
//! `CoreError` via `From` impls or keep them separate.  Recoverable planning
//! outcomes (no path found) are *not* errors — they are `None` results;
//! errors are reserved for malformed inputs and configuration.

use thiserror::Error;

/// The top-level error type for `rp-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `rp-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
