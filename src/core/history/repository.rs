//! Persistence for the operation log.

use super::types::{NewOperation, Operation};
use crate::error::{LogError, OperationError};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;
use tracing::debug;

/// Ordered, durable record of every delete, undo and purge.
///
/// The whole log is rewritten on each mutation: serialized to a sibling
/// temp file, flushed, then renamed over the old file. Id assignment and
/// the write happen under one lock, so concurrent appends never share an id.
pub struct OperationLog {
    path: PathBuf,
    operations: Mutex<Vec<Operation>>,
}

impl OperationLog {
    /// Load the log at `path`, or start empty if it does not exist yet
    pub fn open(path: &Path) -> Result<Self, LogError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| LogError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let operations = match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Vec::new(),
            Ok(raw) => Self::parse(path, &raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(LogError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        debug!(path = %path.display(), count = operations.len(), "loaded operation log");

        Ok(Self {
            path: path.to_path_buf(),
            operations: Mutex::new(operations),
        })
    }

    fn parse(path: &Path, raw: &str) -> Result<Vec<Operation>, LogError> {
        let operations: Vec<Operation> =
            serde_json::from_str(raw).map_err(|e| LogError::Corrupted {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if let Some(pair) = operations.windows(2).find(|w| w[0].id >= w[1].id) {
            return Err(LogError::Corrupted {
                path: path.to_path_buf(),
                reason: format!("operation ids out of order at {} -> {}", pair[0].id, pair[1].id),
            });
        }

        Ok(operations)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Operation>> {
        self.operations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, operations: &[Operation]) -> Result<(), LogError> {
        let io_err = |source| LogError::Io {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_vec_pretty(operations)
            .map_err(|e| LogError::Serialize(e.to_string()))?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Assign the next id, record the operation and write the log.
    ///
    /// If the write fails the record is kept in memory (a later successful
    /// write will carry it) and `LogPersistence` is returned.
    pub fn append(&self, new: NewOperation) -> Result<Operation, OperationError> {
        let mut operations = self.lock();

        // Ids are never reused, even if the head of the file was trimmed by hand
        let next_id = operations
            .last()
            .map_or(0, |op| op.id + 1)
            .max(operations.len() as u64);

        let operation = new.into_operation(next_id);
        operations.push(operation.clone());

        self.persist(&operations)
            .map_err(|source| OperationError::LogPersistence {
                id: operation.id,
                backup_path: operation.backup_path.clone(),
                source,
            })?;

        Ok(operation)
    }

    /// Look up an operation by id
    pub fn get(&self, id: u64) -> Result<Operation, OperationError> {
        let operations = self.lock();
        Self::position(&operations, id).map(|idx| operations[idx].clone())
    }

    fn position(operations: &[Operation], id: u64) -> Result<usize, OperationError> {
        operations
            .binary_search_by_key(&id, |op| op.id)
            .map_err(|_| OperationError::NotFound { id })
    }

    /// Record a successful undo
    pub fn mark_undone(&self, id: u64) -> Result<Operation, OperationError> {
        self.finalize(id, |op| op.undone_at = Some(Local::now()))
    }

    /// Record a permanent purge of the backup
    pub fn mark_purged(&self, id: u64) -> Result<Operation, OperationError> {
        self.finalize(id, |op| op.permanently_deleted = true)
    }

    fn finalize<F>(&self, id: u64, mark: F) -> Result<Operation, OperationError>
    where
        F: FnOnce(&mut Operation),
    {
        let mut operations = self.lock();
        let idx = Self::position(&operations, id)?;

        let operation = &mut operations[idx];
        if !operation.can_undo {
            return Err(OperationError::AlreadyFinalized { id });
        }
        operation.can_undo = false;
        mark(operation);
        let updated = operation.clone();

        self.persist(&operations)
            .map_err(|source| OperationError::LogPersistence {
                id,
                backup_path: updated.backup_path.clone(),
                source,
            })?;

        Ok(updated)
    }

    /// Newest first, at most `limit` entries
    pub fn list_recent(&self, limit: usize) -> Vec<Operation> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
