//! # Hasher Module
//!
//! Computes content hashes for discovered artwork.
//!
//! ## How It Works
//! 1. Stream each file in 4 KB chunks through XXH3-128
//! 2. Run files in parallel on a bounded rayon pool
//! 3. Store the result on the entry; entries that already carry a hash
//!    are left alone, so a file is read at most once per scan
//!
//! Unreadable files keep `content_hash == None` and never take part in
//! duplicate detection. A cancelled run returns whatever finished.
//!
//! ## Example
//! ```rust,ignore
//! use artwork_vault::core::hasher::ContentHasher;
//!
//! let hasher = ContentHasher::new().workers(4);
//! let summary = hasher.hash_entries(&mut entries, &cancel, &events)?;
//! ```

mod content;

pub use content::{
    hash_file, hash_file_cancellable, ContentHash, InvalidContentHash, CHUNK_SIZE,
};

use crate::core::scanner::ArtworkEntry;
use crate::error::HashError;
use crate::events::{Event, EventSender, HashEvent, HashProgress};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Counts from one hashing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashSummary {
    /// Entries hashed in this pass
    pub hashed: usize,
    /// Entries that already had a hash
    pub reused: usize,
    /// Entries that could not be read
    pub failed: usize,
    /// Whether the pass stopped early
    pub cancelled: bool,
}

/// Parallel content hasher
#[derive(Debug, Clone, Default)]
pub struct ContentHasher {
    workers: usize,
}

impl ContentHasher {
    /// Use rayon's default thread count
    pub fn new() -> Self {
        Self { workers: 0 }
    }

    /// Number of hashing threads (0 = one per core)
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Hash every entry that does not have a hash yet.
    pub fn hash_entries(
        &self,
        entries: &mut [ArtworkEntry],
        cancel: &AtomicBool,
        events: &EventSender,
    ) -> Result<HashSummary, HashError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("artvault-hash-{}", i))
            .build()
            .map_err(|e| HashError::PoolFailed(e.to_string()))?;

        let total = entries.len();
        let completed = AtomicUsize::new(0);
        let hashed = AtomicUsize::new(0);
        let reused = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        events.send(Event::Hash(HashEvent::Started {
            total_entries: total,
        }));

        pool.install(|| {
            entries.par_iter_mut().for_each(|entry| {
                if entry.content_hash.is_some() {
                    reused.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                if cancel.load(Ordering::Relaxed) {
                    return;
                }

                match hash_file_cancellable(&entry.path, cancel) {
                    Ok(hash) => {
                        debug!(path = %entry.path.display(), %hash, "hashed");
                        entry.content_hash = Some(hash);
                        hashed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(HashError::Cancelled) => return,
                    Err(e) => {
                        warn!("excluding from duplicate detection: {}", e);
                        failed.fetch_add(1, Ordering::Relaxed);
                        events.send(Event::Hash(HashEvent::Error {
                            path: entry.path.clone(),
                            message: e.to_string(),
                        }));
                    }
                }

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if events.is_listening() {
                    events.send(Event::Hash(HashEvent::Progress(HashProgress {
                        completed: done,
                        total,
                        current_path: entry.path.clone(),
                    })));
                }
            });
        });

        let summary = HashSummary {
            hashed: hashed.into_inner(),
            reused: reused.into_inner(),
            failed: failed.into_inner(),
            cancelled: cancel.load(Ordering::Relaxed),
        };

        events.send(Event::Hash(HashEvent::Completed {
            hashed: summary.hashed,
            failed: summary.failed,
            cancelled: summary.cancelled,
        }));

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::ArtworkCategory;
    use crate::events::null_sender;
    use std::path::Path;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn entry_for(dir: &Path, name: &str, content: &[u8]) -> ArtworkEntry {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        ArtworkEntry::new(path, ArtworkCategory::Poster, content.len() as u64, SystemTime::now())
    }

    #[test]
    fn hashes_all_readable_entries() {
        let dir = TempDir::new().unwrap();
        let mut entries = vec![
            entry_for(dir.path(), "a.jpg", b"same"),
            entry_for(dir.path(), "b.jpg", b"same"),
            entry_for(dir.path(), "c.jpg", b"different"),
        ];

        let summary = ContentHasher::new()
            .workers(2)
            .hash_entries(&mut entries, &AtomicBool::new(false), &null_sender())
            .unwrap();

        assert_eq!(summary.hashed, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(entries[0].content_hash, entries[1].content_hash);
        assert_ne!(entries[0].content_hash, entries[2].content_hash);
    }

    #[test]
    fn unreadable_entries_stay_unhashed() {
        let dir = TempDir::new().unwrap();
        let mut entries = vec![
            entry_for(dir.path(), "a.jpg", b"x"),
            ArtworkEntry::new(
                dir.path().join("gone.jpg"),
                ArtworkCategory::Art,
                1,
                SystemTime::now(),
            ),
        ];

        let summary = ContentHasher::new()
            .hash_entries(&mut entries, &AtomicBool::new(false), &null_sender())
            .unwrap();

        assert_eq!(summary.hashed, 1);
        assert_eq!(summary.failed, 1);
        assert!(entries[1].content_hash.is_none());
    }

    #[test]
    fn existing_hashes_are_not_recomputed() {
        let dir = TempDir::new().unwrap();
        let marker = ContentHash::from_bytes(b"memoized");
        let mut entries = vec![entry_for(dir.path(), "a.jpg", b"real content").with_hash(marker)];

        let summary = ContentHasher::new()
            .hash_entries(&mut entries, &AtomicBool::new(false), &null_sender())
            .unwrap();

        assert_eq!(summary.reused, 1);
        assert_eq!(summary.hashed, 0);
        assert_eq!(entries[0].content_hash, Some(marker));
    }

    #[test]
    fn cancelled_pass_leaves_entries_unhashed() {
        let dir = TempDir::new().unwrap();
        let mut entries = vec![
            entry_for(dir.path(), "a.jpg", b"1"),
            entry_for(dir.path(), "b.jpg", b"2"),
        ];

        let summary = ContentHasher::new()
            .hash_entries(&mut entries, &AtomicBool::new(true), &null_sender())
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.hashed, 0);
        assert!(entries.iter().all(|e| e.content_hash.is_none()));
    }
}
