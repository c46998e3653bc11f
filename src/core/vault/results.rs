//! Serializable outcomes handed back to callers.

use crate::core::history::Operation;
use crate::error::OperationError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why one file in a batch did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    /// Stable tag, see [`OperationError::kind`]
    pub kind: String,
    pub message: String,
}

impl From<&OperationError> for FileError {
    fn from(error: &OperationError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Outcome for a single file of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    /// The path exactly as the caller passed it
    pub file: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

impl FileResult {
    pub(crate) fn from_outcome(file: PathBuf, outcome: &Result<Operation, OperationError>) -> Self {
        match outcome {
            Ok(op) => Self {
                file,
                success: true,
                operation_id: Some(op.id),
                backup_path: Some(op.backup_path.clone()),
                error: None,
            },
            // The file did move; keep the id so it can be found by hand
            Err(e @ OperationError::LogPersistence { id, backup_path, .. }) => Self {
                file,
                success: false,
                operation_id: Some(*id),
                backup_path: Some(backup_path.clone()),
                error: Some(e.into()),
            },
            Err(e) => Self {
                file,
                success: false,
                operation_id: None,
                backup_path: None,
                error: Some(e.into()),
            },
        }
    }

    /// Error tag, if the file failed
    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.kind.as_str())
    }
}

/// Outcome of deleting several files together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Id of the first successful operation, if any
    pub batch_id: Option<u64>,
    /// When the batch started, in namespace format
    pub timestamp: String,
    pub total: usize,
    /// One per input path, in input order
    pub results: Vec<FileResult>,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded()
    }
}

/// Outcome of an undo, for callers that want a flat record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoResult {
    pub operation_id: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

impl UndoResult {
    pub fn new(operation_id: u64, outcome: &Result<PathBuf, OperationError>) -> Self {
        match outcome {
            Ok(path) => Self {
                operation_id,
                success: true,
                restored_path: Some(path.clone()),
                error: None,
            },
            Err(e) => Self {
                operation_id,
                success: false,
                restored_path: None,
                error: Some(e.into()),
            },
        }
    }
}

/// Outcome of a purge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeResult {
    pub operation_id: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

impl PurgeResult {
    pub fn new<T>(operation_id: u64, outcome: &Result<T, OperationError>) -> Self {
        Self {
            operation_id,
            success: outcome.is_ok(),
            error: outcome.as_ref().err().map(FileError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_file_carries_kind() {
        let outcome = Err(OperationError::SourceMissing {
            path: PathBuf::from("/plex/missing.jpg"),
        });
        let result = FileResult::from_outcome(PathBuf::from("/plex/missing.jpg"), &outcome);

        assert!(!result.success);
        assert_eq!(result.error_kind(), Some("source_missing"));
        assert!(result.operation_id.is_none());
    }

    #[test]
    fn successful_file_omits_error_in_json() {
        let result = FileResult {
            file: PathBuf::from("/plex/a.jpg"),
            success: true,
            operation_id: Some(1),
            backup_path: Some(PathBuf::from("/backups/20240101_000000/a.jpg")),
            error: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("error"));
        assert!(json.contains("\"operation_id\":1"));
    }

    #[test]
    fn undo_result_flattens_error() {
        let outcome: Result<PathBuf, _> = Err(OperationError::AlreadyFinalized { id: 2 });
        let result = UndoResult::new(2, &outcome);
        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, "already_finalized");
    }
}
