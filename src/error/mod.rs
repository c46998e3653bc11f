//! # Error Module
//!
//! Typed errors for the artwork vault.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, operation ids, what went wrong
//! - **Typed outcomes** - callers match on `OperationError` variants, they
//!   never have to parse messages

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Operation log error: {0}")]
    Log(#[from] LogError),

    #[error("{0}")]
    Operation(#[from] OperationError),

    #[error("Backup store error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Outcome of a single delete, undo or purge that did not go through.
///
/// None of these abort a batch; they are reported per file.
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Operation {id} not found")]
    NotFound { id: u64 },

    #[error("Operation {id} has already been undone or purged")]
    AlreadyFinalized { id: u64 },

    #[error("Backup file not found: {path}")]
    BackupMissing { path: PathBuf },

    #[error("File does not exist: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Failed to relocate {path}: {reason}")]
    RelocationFailed { path: PathBuf, reason: String },

    #[error(
        "File was moved to {backup_path} but operation {id} could not be written to the log: {source}. \
         The backup must be inspected manually."
    )]
    LogPersistence {
        id: u64,
        backup_path: PathBuf,
        #[source]
        source: LogError,
    },
}

impl OperationError {
    /// Short machine-readable tag, stable across message wording changes
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyFinalized { .. } => "already_finalized",
            Self::BackupMissing { .. } => "backup_missing",
            Self::SourceMissing { .. } => "source_missing",
            Self::RelocationFailed { .. } => "relocation_failed",
            Self::LogPersistence { .. } => "log_persistence",
        }
    }

    pub(crate) fn relocation(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::RelocationFailed {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Errors that occur during artwork discovery
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while computing a content hash
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hashing was cancelled")]
    Cancelled,

    #[error("Failed to start hashing workers: {0}")]
    PoolFailed(String),
}

/// Errors that occur loading or writing the operation log
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to access operation log at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation log at {path} is unreadable ({reason}). Inspect or move this file before restarting.")]
    Corrupted { path: PathBuf, reason: String },

    #[error("Failed to serialize operation log: {0}")]
    Serialize(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, VaultError>;
