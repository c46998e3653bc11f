//! Per-path mutual exclusion.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, PoisonError};

/// Set of paths currently being worked on.
///
/// Callers touching the same path queue up; different paths never block
/// each other beyond the short critical section on the set itself.
#[derive(Default)]
pub struct PathLocks {
    held: Mutex<HashSet<PathBuf>>,
    released: Condvar,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no one else holds `path`, then hold it until the guard drops
    pub fn acquire(&self, path: &Path) -> PathGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(path) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(path.to_path_buf());

        PathGuard {
            locks: self,
            path: path.to_path_buf(),
        }
    }

    fn release(&self, path: &Path) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        held.remove(path);
        self.released.notify_all();
    }
}

/// Releases its path on drop
pub struct PathGuard<'a> {
    locks: &'a PathLocks,
    path: PathBuf,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.path);
    }
}
