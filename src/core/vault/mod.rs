//! # Vault Module
//!
//! The one entry point for deleting, restoring and purging artwork.
//!
//! A `Vault` ties the backup store to the operation log: every delete is a
//! relocation followed by a log append, every undo is a restore followed by
//! marking the record. Work on the same original path is serialized; work on
//! different paths runs concurrently, so a `Vault` can be shared behind an
//! `Arc` by any number of request handlers.
//!
//! ## Example
//! ```rust,ignore
//! use artwork_vault::Vault;
//!
//! let vault = Vault::builder().backup_root("/srv/artwork-backups").open()?;
//! let batch = vault.delete(&["/plex/Metadata/Movies/a/posters/x.jpg"], "duplicate");
//! if let Some(id) = batch.results[0].operation_id {
//!     vault.undo(id)?;
//! }
//! ```

mod config;
mod results;

pub use config::{VaultBuilder, VaultConfig, DEFAULT_LOG_FILE};
pub use results::{BatchResult, FileError, FileResult, PurgeResult, UndoResult};

use crate::core::backup::{namespace_name, BackupStore, BackupUsage};
use crate::core::comparator::{self, DuplicatePair};
use crate::core::hasher::ContentHasher;
use crate::core::history::{NewOperation, Operation, OperationLog};
use crate::core::pipeline::{scan_for_duplicates, ScanReport};
use crate::core::retention::{self, CleanResult};
use crate::core::scanner::{ArtworkEntry, ScanConfig};
use crate::error::{OperationError, Result, VaultError};
use crate::events::{DeleteEvent, Event, EventSender, UndoEvent};
use chrono::{Duration, Local, NaiveDateTime, SubsecRound};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::{error, info, warn};

/// Safe-delete and recovery engine over one backup root
pub struct Vault {
    config: VaultConfig,
    log: OperationLog,
    store: BackupStore,
    events: EventSender,
}

impl Vault {
    /// Create a builder for configuring a vault
    pub fn builder() -> VaultBuilder {
        VaultBuilder::new()
    }

    /// Open a vault with default settings at `backup_root`
    pub fn open(backup_root: impl Into<PathBuf>) -> Result<Self> {
        VaultBuilder::new().backup_root(backup_root).open()
    }

    pub(crate) fn open_with(config: VaultConfig, events: EventSender) -> Result<Self> {
        let store = BackupStore::open(&config.backup_root, &config.log_file_name)?;
        let log = OperationLog::open(&config.log_path())?;

        info!(
            backup_root = %config.backup_root.display(),
            operations = log.len(),
            "vault opened"
        );

        Ok(Self {
            config,
            log,
            store,
            events,
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn backup_root(&self) -> &Path {
        self.store.root()
    }

    /// Move one file into the backup store and log it.
    ///
    /// The returned operation is already durable in the log. A
    /// `LogPersistence` error means the file *was* moved but the record
    /// could not be written; the backup must then be inspected by hand.
    pub fn delete_one(&self, path: &Path, reason: &str) -> std::result::Result<Operation, OperationError> {
        let original = absolute(path);
        let _guard = self.store.lock_path(&original);

        let at = now();
        let outcome = self
            .store
            .relocate(&original, at)
            .and_then(|relocation| {
                self.log.append(NewOperation::delete(
                    at,
                    &original,
                    &relocation.backup_path,
                    reason,
                ))
            });

        match &outcome {
            Ok(op) => {
                info!(
                    id = op.id,
                    original = %op.original_path.display(),
                    backup = %op.backup_path.display(),
                    reason,
                    "deleted"
                );
                self.events.send(Event::Delete(DeleteEvent::Relocated {
                    operation_id: op.id,
                    original_path: op.original_path.clone(),
                    backup_path: op.backup_path.clone(),
                }));
            }
            Err(e) => {
                if matches!(e, OperationError::LogPersistence { .. }) {
                    error!("{}", e);
                } else {
                    warn!(path = %original.display(), "delete failed: {}", e);
                }
                self.events.send(Event::Delete(DeleteEvent::Failed {
                    path: original.clone(),
                    message: e.to_string(),
                }));
            }
        }

        outcome
    }

    /// Delete several files; one file failing never stops the rest.
    pub fn delete<P: AsRef<Path>>(&self, paths: &[P], reason: &str) -> BatchResult {
        let timestamp = namespace_name(now());

        let results: Vec<FileResult> = paths
            .iter()
            .map(|path| {
                let outcome = self.delete_one(path.as_ref(), reason);
                FileResult::from_outcome(path.as_ref().to_path_buf(), &outcome)
            })
            .collect();

        let batch_id = results
            .iter()
            .find(|r| r.success)
            .and_then(|r| r.operation_id);

        let batch = BatchResult {
            batch_id,
            timestamp,
            total: paths.len(),
            results,
        };

        info!(
            total = batch.total,
            succeeded = batch.succeeded(),
            "delete batch finished"
        );
        self.events.send(Event::Delete(DeleteEvent::BatchCompleted {
            batch_id: batch.batch_id,
            total: batch.total,
            succeeded: batch.succeeded(),
        }));

        batch
    }

    /// Move a deleted file back to where it was.
    pub fn undo(&self, id: u64) -> std::result::Result<PathBuf, OperationError> {
        let outcome = self.undo_inner(id);

        match &outcome {
            Ok(path) => {
                info!(id, path = %path.display(), "restored");
                self.events.send(Event::Undo(UndoEvent::Restored {
                    operation_id: id,
                    path: path.clone(),
                }));
            }
            Err(e) => {
                if matches!(e, OperationError::LogPersistence { .. }) {
                    error!("{}", e);
                } else {
                    warn!(id, "undo failed: {}", e);
                }
                self.events.send(Event::Undo(UndoEvent::Failed {
                    operation_id: id,
                    message: e.to_string(),
                }));
            }
        }

        outcome
    }

    fn undo_inner(&self, id: u64) -> std::result::Result<PathBuf, OperationError> {
        let op = self.log.get(id)?;
        let _guard = self.store.lock_path(&op.original_path);

        // Another caller may have finalized it while we waited for the lock
        let op = self.log.get(id)?;
        if !op.can_undo {
            return Err(OperationError::AlreadyFinalized { id });
        }

        let restored = self.store.restore(&op)?;
        self.log.mark_undone(id)?;
        Ok(restored)
    }

    /// Flat record form of [`Vault::undo`]
    pub fn undo_result(&self, id: u64) -> UndoResult {
        UndoResult::new(id, &self.undo(id))
    }

    /// Remove an operation's backup for good; it can no longer be undone.
    pub fn purge(&self, id: u64) -> std::result::Result<Operation, OperationError> {
        let op = self.log.get(id)?;
        let _guard = self.store.lock_path(&op.original_path);

        let op = self.log.get(id)?;
        if !op.can_undo {
            return Err(OperationError::AlreadyFinalized { id });
        }

        // A missing backup leaves the record untouched, same as undo
        self.store
            .purge(&op)
            .inspect_err(|e| warn!(id, "purge failed: {}", e))?;

        let purged = self.log.mark_purged(id).inspect_err(|e| error!("{}", e))?;
        info!(id, "purged");
        Ok(purged)
    }

    /// Flat record form of [`Vault::purge`]
    pub fn purge_result(&self, id: u64) -> PurgeResult {
        PurgeResult::new(id, &self.purge(id))
    }

    pub fn get_operation(&self, id: u64) -> std::result::Result<Operation, OperationError> {
        self.log.get(id)
    }

    /// Most recent operations, newest first
    pub fn list_operations(&self, limit: usize) -> Vec<Operation> {
        self.log.list_recent(limit)
    }

    pub fn backup_usage(&self) -> BackupUsage {
        self.store.usage()
    }

    /// Remove backup namespaces older than `max_age_days`.
    ///
    /// Affected operations stay undoable in the log; undoing them reports
    /// `BackupMissing`.
    pub fn clean_backups(&self, max_age_days: u32) -> Result<CleanResult> {
        self.clean_backups_older_than(Duration::days(i64::from(max_age_days)))
    }

    pub fn clean_backups_older_than(&self, max_age: Duration) -> Result<CleanResult> {
        retention::sweep(&self.store, max_age, &self.events).map_err(|source| {
            VaultError::Storage {
                path: self.store.root().to_path_buf(),
                source,
            }
        })
    }

    /// Remove namespaces created at or before `cutoff`
    pub fn clean_backups_before(&self, cutoff: NaiveDateTime) -> Result<CleanResult> {
        retention::sweep_before(&self.store, cutoff, &self.events).map_err(|source| {
            VaultError::Storage {
                path: self.store.root().to_path_buf(),
                source,
            }
        })
    }

    /// Pairwise duplicates among already-hashed entries
    pub fn find_duplicates(&self, entries: &[ArtworkEntry]) -> Vec<DuplicatePair> {
        comparator::find_duplicates(entries)
    }

    /// Walk `paths`, hash every artwork file once and report duplicates
    pub fn scan(&self, paths: &[PathBuf], cancel: &AtomicBool) -> Result<ScanReport> {
        self.scan_with_config(paths, ScanConfig::default(), cancel)
    }

    pub fn scan_with_config(
        &self,
        paths: &[PathBuf],
        scan_config: ScanConfig,
        cancel: &AtomicBool,
    ) -> Result<ScanReport> {
        let hasher = ContentHasher::new().workers(self.config.hash_workers);
        scan_for_duplicates(paths, scan_config, &hasher, cancel, &self.events)
    }
}

/// Second precision, so the record and the namespace name agree exactly
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::ContentHash;
    use crate::core::scanner::ArtworkCategory;
    use crate::events::EventChannel;
    use std::fs;
    use std::sync::Arc;
    use std::time::SystemTime;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        vault: Vault,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let vault = Vault::open(temp.path().join("backups")).unwrap();
            Self { temp, vault }
        }

        fn artwork(&self, rel: &str, content: &[u8]) -> PathBuf {
            let path = self.temp.path().join("metadata").join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }
    }

    #[test]
    fn delete_then_undo_restores_bytes() {
        let fx = Fixture::new();
        let path = fx.artwork("show/posters/a.jpg", b"poster bytes");

        let op = fx.vault.delete_one(&path, "duplicate").unwrap();
        assert!(!path.exists());
        assert!(op.backup_path.exists());
        assert!(op.can_undo);

        let restored = fx.vault.undo(op.id).unwrap();
        assert_eq!(restored, path);
        assert_eq!(fs::read(&path).unwrap(), b"poster bytes");
        assert!(!op.backup_path.exists());

        let record = fx.vault.get_operation(op.id).unwrap();
        assert!(!record.can_undo);
        assert!(record.undone_at.is_some());
    }

    #[test]
    fn second_undo_is_already_finalized() {
        let fx = Fixture::new();
        let path = fx.artwork("posters/a.jpg", b"x");
        let op = fx.vault.delete_one(&path, "test").unwrap();

        fx.vault.undo(op.id).unwrap();

        assert!(matches!(
            fx.vault.undo(op.id),
            Err(OperationError::AlreadyFinalized { .. })
        ));
    }

    #[test]
    fn undo_unknown_id() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.vault.undo(99),
            Err(OperationError::NotFound { id: 99 })
        ));
    }

    #[test]
    fn record_timestamp_matches_namespace() {
        let fx = Fixture::new();
        let path = fx.artwork("art/a.png", b"x");

        let op = fx.vault.delete_one(&path, "test").unwrap();

        let parent = op.backup_path.parent().unwrap().file_name().unwrap();
        assert_eq!(parent.to_string_lossy(), op.namespace());
    }

    #[test]
    fn batch_reports_each_file() {
        let fx = Fixture::new();
        let good = fx.artwork("posters/a.jpg", b"a");
        let missing = fx.temp.path().join("metadata/posters/missing.jpg");

        let batch = fx.vault.delete(&[good.clone(), missing.clone()], "cleanup");

        assert_eq!(batch.total, 2);
        assert_eq!(batch.succeeded(), 1);
        assert!(batch.results[0].success);
        assert_eq!(batch.results[1].file, missing);
        assert_eq!(batch.results[1].error_kind(), Some("source_missing"));
        assert_eq!(batch.batch_id, batch.results[0].operation_id);
        assert_eq!(fx.vault.list_operations(10).len(), 1);
    }

    #[test]
    fn batch_of_only_failures_has_no_id() {
        let fx = Fixture::new();
        let batch = fx.vault.delete(&[fx.temp.path().join("nope.jpg")], "test");
        assert_eq!(batch.batch_id, None);
        assert_eq!(batch.failed(), 1);
    }

    #[test]
    fn purge_removes_backup_and_blocks_undo() {
        let fx = Fixture::new();
        let path = fx.artwork("posters/a.jpg", b"x");
        let op = fx.vault.delete_one(&path, "test").unwrap();

        let purged = fx.vault.purge(op.id).unwrap();

        assert!(purged.permanently_deleted);
        assert!(!op.backup_path.exists());
        assert!(matches!(
            fx.vault.undo(op.id),
            Err(OperationError::AlreadyFinalized { .. })
        ));
        assert!(matches!(
            fx.vault.purge(op.id),
            Err(OperationError::AlreadyFinalized { .. })
        ));
    }

    #[test]
    fn purge_of_missing_backup_leaves_record_undoable() {
        let fx = Fixture::new();
        let path = fx.artwork("posters/a.jpg", b"x");
        let op = fx.vault.delete_one(&path, "test").unwrap();
        fs::remove_file(&op.backup_path).unwrap();

        let result = fx.vault.purge(op.id);

        assert!(matches!(result, Err(OperationError::BackupMissing { .. })));
        let record = fx.vault.get_operation(op.id).unwrap();
        assert!(record.can_undo);
        assert!(!record.permanently_deleted);
        assert_eq!(fx.vault.purge_result(op.id).error.unwrap().kind, "backup_missing");
    }

    #[test]
    fn sweep_then_undo_reports_missing_backup() {
        let fx = Fixture::new();
        let path = fx.artwork("posters/a.jpg", b"x");
        let op = fx.vault.delete_one(&path, "test").unwrap();

        let cleaned = fx.vault.clean_backups(0).unwrap();
        assert_eq!(cleaned.removed_count, 1);

        assert!(fx.vault.get_operation(op.id).unwrap().can_undo);
        assert!(matches!(
            fx.vault.undo(op.id),
            Err(OperationError::BackupMissing { .. })
        ));
    }

    #[test]
    fn undo_refuses_to_overwrite_new_file() {
        let fx = Fixture::new();
        let path = fx.artwork("posters/a.jpg", b"old");
        let op = fx.vault.delete_one(&path, "test").unwrap();
        fs::write(&path, b"replacement").unwrap();

        let result = fx.vault.undo_result(op.id);

        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, "relocation_failed");
        assert_eq!(fs::read(&path).unwrap(), b"replacement");
        assert!(fx.vault.get_operation(op.id).unwrap().can_undo);
    }

    #[test]
    fn concurrent_deletes_of_one_path_move_it_once() {
        let fx = Fixture::new();
        let path = fx.artwork("show/posters/poster.jpg", b"contended");
        let vault = Arc::new(fx.vault);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let vault = Arc::clone(&vault);
                let path = path.clone();
                std::thread::spawn(move || vault.delete_one(&path, "race"))
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let moved: Vec<&Operation> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(fs::read(&moved[0].backup_path).unwrap(), b"contended");
        assert!(outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .all(|e| matches!(e, OperationError::SourceMissing { .. })));
        assert_eq!(vault.list_operations(10).len(), 1);
    }

    #[test]
    fn concurrent_deletes_get_distinct_ids_and_backups() {
        let fx = Fixture::new();
        let paths: Vec<PathBuf> = (0..16)
            .map(|i| fx.artwork(&format!("show{}/posters/poster.jpg", i), &[i as u8; 64]))
            .collect();
        let vault = Arc::new(fx.vault);

        let handles: Vec<_> = paths
            .into_iter()
            .map(|path| {
                let vault = Arc::clone(&vault);
                std::thread::spawn(move || vault.delete_one(&path, "race").unwrap())
            })
            .collect();
        let ops: Vec<Operation> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let mut ids: Vec<u64> = ops.iter().map(|o| o.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);

        let mut backups: Vec<&PathBuf> = ops.iter().map(|o| &o.backup_path).collect();
        backups.sort();
        backups.dedup();
        assert_eq!(backups.len(), 16);
    }

    #[test]
    fn events_follow_deletes() {
        let temp = TempDir::new().unwrap();
        let (sender, receiver) = EventChannel::new();
        let vault = Vault::builder()
            .backup_root(temp.path().join("backups"))
            .events(sender)
            .open()
            .unwrap();
        let path = temp.path().join("a.jpg");
        fs::write(&path, b"x").unwrap();

        vault.delete(&[path], "test");

        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Event::Delete(DeleteEvent::Relocated { .. })
        ));
        assert!(matches!(
            events[1],
            Event::Delete(DeleteEvent::BatchCompleted { total: 1, succeeded: 1, .. })
        ));
    }

    #[test]
    fn find_duplicates_delegates_to_comparator() {
        let fx = Fixture::new();
        let hash = ContentHash::from_bytes(b"same");
        let entry = |name: &str| {
            ArtworkEntry::new(name, ArtworkCategory::Poster, 4, SystemTime::UNIX_EPOCH).with_hash(hash)
        };

        let pairs = fx.vault.find_duplicates(&[entry("/a.jpg"), entry("/b.jpg")]);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].duplicate_entry.path, PathBuf::from("/b.jpg"));
    }

    #[test]
    fn reopen_sees_previous_operations() {
        let fx = Fixture::new();
        let path = fx.artwork("posters/a.jpg", b"x");
        let op = fx.vault.delete_one(&path, "test").unwrap();
        let root = fx.vault.backup_root().to_path_buf();
        drop(fx.vault);

        let reopened = Vault::open(&root).unwrap();
        let loaded = reopened.get_operation(op.id).unwrap();
        assert_eq!(loaded, op);
        reopened.undo(op.id).unwrap();
        assert!(path.exists());
    }
}
