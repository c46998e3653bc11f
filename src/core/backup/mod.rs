//! # Backup Store Module
//!
//! Where deleted artwork goes instead of being destroyed.
//!
//! ## Layout
//! ```text
//! <root>/
//!   operations.json
//!   20240309_140507/
//!     poster.jpg
//!     poster.3f9c0a1b2d4e5f60.jpg   <- same leaf name, same second
//!   20240309_140512/
//!     background.png
//! ```
//!
//! Each relocation lands in the namespace named after its timestamp;
//! relocations within the same second share a directory. A second file with
//! an already-used leaf name gets a suffix derived from its source path, so
//! no backup ever overwrites another.

mod locks;
mod relocate;

pub use locks::{PathGuard, PathLocks};
pub use relocate::move_file;

use crate::core::history::Operation;
use crate::error::{OperationError, VaultError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

/// Namespace directory names; sorts lexically in time order
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Give up on disambiguating a leaf name after this many attempts
const MAX_NAME_ATTEMPTS: u32 = 1000;

pub fn namespace_name(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// `None` for directory names that are not namespaces
pub fn parse_namespace(name: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(name, TIMESTAMP_FORMAT).ok()
}

/// Where a relocated file ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub backup_path: PathBuf,
    pub namespace: String,
}

/// An existing namespace directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub created: NaiveDateTime,
    pub path: PathBuf,
}

/// Space taken by the backup store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupUsage {
    pub total_size_bytes: u64,
    /// Megabytes, rounded to two decimals
    pub total_size_mb: f64,
    pub file_count: usize,
}

/// Owns every file relocated into the backup root
pub struct BackupStore {
    root: PathBuf,
    log_file_name: String,
    path_locks: PathLocks,
    // Moves in and out share it, retention sweeps take it exclusively
    namespaces: RwLock<()>,
}

impl BackupStore {
    /// Open (and create if needed) the backup root
    pub fn open(root: &Path, log_file_name: &str) -> Result<Self, VaultError> {
        fs::create_dir_all(root).map_err(|source| VaultError::Storage {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            log_file_name: log_file_name.to_string(),
            path_locks: PathLocks::new(),
            namespaces: RwLock::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serialize work on one source path
    pub fn lock_path(&self, path: &Path) -> PathGuard<'_> {
        self.path_locks.acquire(path)
    }

    fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.namespaces.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.namespaces.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `source` into the namespace for `at`.
    pub fn relocate(&self, source: &Path, at: NaiveDateTime) -> Result<Relocation, OperationError> {
        match fs::symlink_metadata(source) {
            Ok(meta) if meta.is_dir() => {
                return Err(OperationError::relocation(source, "not a regular file"))
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(OperationError::SourceMissing {
                    path: source.to_path_buf(),
                })
            }
            Err(e) => return Err(OperationError::relocation(source, e)),
        }

        let _shared = self.shared();

        let namespace = namespace_name(at);
        let dir = self.root.join(&namespace);
        fs::create_dir_all(&dir).map_err(|e| OperationError::relocation(source, e))?;

        let dest = self.reserve_destination(&dir, source)?;
        if let Err(e) = move_file(source, &dest) {
            let _ = fs::remove_file(&dest);
            return Err(if e.kind() == ErrorKind::NotFound && !source.exists() {
                OperationError::SourceMissing {
                    path: source.to_path_buf(),
                }
            } else {
                OperationError::relocation(source, e)
            });
        }

        debug!(source = %source.display(), backup = %dest.display(), "relocated");
        Ok(Relocation {
            backup_path: dest,
            namespace,
        })
    }

    /// Claim a free file name in `dir` by creating it empty.
    ///
    /// Creation with `create_new` is atomic, so concurrent relocations of
    /// same-named files can never pick the same destination.
    fn reserve_destination(&self, dir: &Path, source: &Path) -> Result<PathBuf, OperationError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| OperationError::relocation(source, "path has no file name"))?;
        let leaf = Path::new(file_name);
        let stem = leaf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = leaf.extension().map(|e| e.to_string_lossy().into_owned());
        let tag = format!("{:016x}", xxh3_64(source.to_string_lossy().as_bytes()));

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = match attempt {
                0 => file_name.to_string_lossy().into_owned(),
                1 => with_ext(format!("{}.{}", stem, tag), &ext),
                n => with_ext(format!("{}.{}-{}", stem, tag, n - 1), &ext),
            };
            let candidate = dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(OperationError::relocation(source, e)),
            }
        }

        Err(OperationError::relocation(
            source,
            format!("no free backup name in {}", dir.display()),
        ))
    }

    /// Move an operation's backup back to its original location
    pub fn restore(&self, operation: &Operation) -> Result<PathBuf, OperationError> {
        let backup = &operation.backup_path;
        let original = &operation.original_path;
        let _shared = self.shared();

        if !backup.is_file() {
            return Err(OperationError::BackupMissing {
                path: backup.clone(),
            });
        }
        if original.exists() {
            return Err(OperationError::relocation(
                original,
                "a file already exists at the original location",
            ));
        }

        if let Some(parent) = original.parent() {
            fs::create_dir_all(parent).map_err(|e| OperationError::relocation(original, e))?;
        }

        move_file(backup, original).map_err(|e| OperationError::relocation(original, e))?;

        debug!(backup = %backup.display(), original = %original.display(), "restored");
        Ok(original.clone())
    }

    /// Delete an operation's backup for good
    pub fn purge(&self, operation: &Operation) -> Result<(), OperationError> {
        let backup = &operation.backup_path;
        let _shared = self.shared();

        match fs::remove_file(backup) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(OperationError::BackupMissing {
                path: backup.clone(),
            }),
            Err(e) => Err(OperationError::relocation(backup, e)),
        }
    }

    /// Namespace directories under the root, oldest first
    pub fn namespaces(&self) -> std::io::Result<Vec<Namespace>> {
        let mut found = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match parse_namespace(&name) {
                Some(created) => found.push(Namespace {
                    name,
                    created,
                    path: entry.path(),
                }),
                None => debug!(dir = %name, "not a backup namespace, ignoring"),
            }
        }

        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    /// Total size and count of backed-up files (the log itself is not counted)
    pub fn usage(&self) -> BackupUsage {
        let log_path = self.root.join(&self.log_file_name);
        let mut total_size_bytes = 0u64;
        let mut file_count = 0usize;

        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable backup entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.path() == log_path {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                total_size_bytes += meta.len();
                file_count += 1;
            }
        }

        let mb = total_size_bytes as f64 / (1024.0 * 1024.0);
        BackupUsage {
            total_size_bytes,
            total_size_mb: (mb * 100.0).round() / 100.0,
            file_count,
        }
    }
}

fn with_ext(stem: String, ext: &Option<String>) -> String {
    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}
