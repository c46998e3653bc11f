//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Artwork discovery events
    Scan(ScanEvent),
    /// Content hashing events
    Hash(HashEvent),
    /// Safe-delete events
    Delete(DeleteEvent),
    /// Undo events
    Undo(UndoEvent),
    /// Backup retention events
    Retention(RetentionEvent),
}

/// Events during artwork discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Discovery has started
    Started { paths: Vec<PathBuf> },
    /// An entry could not be read but discovery continues
    Error { path: PathBuf, message: String },
    /// Discovery completed
    Completed { total_entries: usize },
}

/// Events during content hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Hashing has started
    Started { total_entries: usize },
    /// Progress update during hashing
    Progress(HashProgress),
    /// A file could not be hashed; it is left out of duplicate detection
    Error { path: PathBuf, message: String },
    /// Hashing completed
    Completed {
        hashed: usize,
        failed: usize,
        cancelled: bool,
    },
}

/// Progress information during hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Number of entries processed so far
    pub completed: usize,
    /// Total number of entries to hash
    pub total: usize,
    /// Entry that just finished
    pub current_path: PathBuf,
}

/// Events emitted while deleting files into the backup store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeleteEvent {
    /// A file was moved into the backup store and logged
    Relocated {
        operation_id: u64,
        original_path: PathBuf,
        backup_path: PathBuf,
    },
    /// A file could not be deleted; the batch continues
    Failed { path: PathBuf, message: String },
    /// A batch finished
    BatchCompleted {
        batch_id: Option<u64>,
        total: usize,
        succeeded: usize,
    },
}

/// Events emitted by undo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UndoEvent {
    Restored { operation_id: u64, path: PathBuf },
    Failed { operation_id: u64, message: String },
}

/// Events emitted by the retention sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RetentionEvent {
    NamespaceRemoved { name: String },
    Completed { removed: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_events_are_serializable() {
        let event = Event::Delete(DeleteEvent::Relocated {
            operation_id: 4,
            original_path: PathBuf::from("/plex/posters/a.jpg"),
            backup_path: PathBuf::from("/backups/20240101_120000/a.jpg"),
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Delete(DeleteEvent::Relocated { operation_id, .. }) => {
                assert_eq!(operation_id, 4);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn batch_completed_serializes_missing_batch_id_as_null() {
        let event = DeleteEvent::BatchCompleted {
            batch_id: None,
            total: 2,
            succeeded: 0,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("null"));
    }
}
