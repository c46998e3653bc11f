//! # Core Module
//!
//! The UI-agnostic safe-delete engine.
//!
//! ## Modules
//! - `scanner` - Discovers artwork files in directories
//! - `hasher` - Computes streaming content hashes
//! - `comparator` - Finds byte-identical duplicates
//! - `pipeline` - Runs discovery, hashing and detection together
//! - `history` - Durable log of every delete, undo and purge
//! - `backup` - Timestamped backup store and safe file moves
//! - `retention` - Age-based cleanup of old backups
//! - `vault` - Coordinates deletes, undos and purges

pub mod backup;
pub mod comparator;
pub mod hasher;
pub mod history;
pub mod pipeline;
pub mod retention;
pub mod scanner;
pub mod vault;

// Re-export commonly used types
pub use backup::BackupUsage;
pub use comparator::{DuplicateGroup, DuplicatePair};
pub use hasher::ContentHash;
pub use history::Operation;
pub use pipeline::ScanReport;
pub use retention::CleanResult;
pub use scanner::{ArtworkCategory, ArtworkEntry};
pub use vault::{BatchResult, FileResult, PurgeResult, UndoResult};
