//! Error types for the front-desk triage log.
//!
//! Fallible operations return `FrontDeskResult<T>`.  Verification failures
//! are described by `ChainViolation`, which always names the 1-based line of
//! the first bad record so an operator can go straight to it.

use std::path::Path;

use thiserror::Error;

/// The unified error type for the front-desk crates.
#[derive(Debug, Error)]
pub enum FrontDeskError {
    /// A file could not be opened, read, written, or synced.
    ///
    /// Append-side I/O errors are always fatal; no input item is dropped
    /// silently.
    #[error("I/O error on '{path}': {reason}")]
    Io { path: String, reason: String },

    /// The log's hash chain is broken or one of its lines is unreadable.
    #[error("log chain broken at {0}")]
    Chain(#[from] ChainViolation),

    /// Another writer holds the advisory lock for this log.
    #[error("log is locked by another writer (lock file '{path}')")]
    Locked { path: String },

    /// A record could not be rendered to JSON.
    #[error("record encoding failed: {reason}")]
    Encoding { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A caller supplied something that is not a `T-####` id.
    #[error("invalid record id '{id}'")]
    InvalidId { id: String },

    /// A caller supplied an unknown status name.
    #[error("invalid status '{value}'")]
    InvalidStatus { value: String },

    /// A caller supplied an unknown record source.
    #[error("invalid source '{value}'")]
    InvalidSource { value: String },

    /// A day was already marked as missed.
    #[error("{day} is already marked as missed")]
    AlreadyMissed { day: String },
}

impl FrontDeskError {
    /// Wrap an `std::io::Error` together with the path it happened on.
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        FrontDeskError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// The first inconsistency found while replaying a log file.
///
/// Structural variants (`Parse`, `MissingField`) mean a line could not be
/// read as a record at all.  Chain variants mean the record was readable but
/// does not link correctly.  All of them abort verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainViolation {
    #[error("line {line}: not JSON ({reason})")]
    Parse { line: usize, reason: String },

    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: hash mismatch (have {stored}, expected {expected})")]
    HashMismatch {
        line: usize,
        stored: String,
        expected: String,
    },

    #[error("line {line}: prev_hash mismatch (have {stored}, expected {expected})")]
    PrevHashMismatch {
        line: usize,
        stored: String,
        expected: String,
    },

    #[error("line {line}: id {id} is not greater than preceding id {previous}")]
    IdOrder {
        line: usize,
        id: String,
        previous: String,
    },
}

impl ChainViolation {
    /// The 1-based line number the violation was found on.
    pub fn line(&self) -> usize {
        match self {
            ChainViolation::Parse { line, .. }
            | ChainViolation::MissingField { line, .. }
            | ChainViolation::HashMismatch { line, .. }
            | ChainViolation::PrevHashMismatch { line, .. }
            | ChainViolation::IdOrder { line, .. } => *line,
        }
    }
}

/// Convenience alias used throughout the front-desk crates.
pub type FrontDeskResult<T> = Result<T, FrontDeskError>;
