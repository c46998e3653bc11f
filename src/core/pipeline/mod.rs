//! # Pipeline Module
//!
//! Discover → hash → detect, in one call.
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌────────────┐
//! │ Scanner  │───▶│  Hasher  │───▶│ Comparator │
//! └──────────┘    └──────────┘    └────────────┘
//! ```

use crate::core::comparator::{find_duplicates, group_duplicates, DuplicateGroup, DuplicatePair};
use crate::core::hasher::{ContentHasher, HashSummary};
use crate::core::scanner::{ArtworkEntry, ArtworkScanner, ScanConfig, WalkDirScanner};
use crate::error::VaultError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use tracing::info;

/// Everything one scan found
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Discovered entries in discovery order, with hashes where readable
    pub entries: Vec<ArtworkEntry>,
    pub pairs: Vec<DuplicatePair>,
    pub groups: Vec<DuplicateGroup>,
    pub hash_summary: HashSummary,
    /// Non-fatal discovery problems
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl ScanReport {
    /// Bytes reclaimable by deleting every duplicate
    pub fn wasted_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.wasted_bytes).sum()
    }
}

/// Run a full duplicate scan over local directories.
///
/// Setting `cancel` stops hashing early; the report then covers only the
/// entries hashed so far.
pub fn scan_for_duplicates(
    paths: &[PathBuf],
    scan_config: ScanConfig,
    hasher: &ContentHasher,
    cancel: &AtomicBool,
    events: &EventSender,
) -> Result<ScanReport, VaultError> {
    let start = Instant::now();

    let scanner = WalkDirScanner::new(scan_config);
    let scan = scanner.scan_with_events(paths, events)?;
    let errors: Vec<String> = scan.errors.iter().map(|e| e.to_string()).collect();

    let mut entries = scan.entries;
    let hash_summary = hasher.hash_entries(&mut entries, cancel, events)?;

    let pairs = find_duplicates(&entries);
    let groups = group_duplicates(&entries);

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        entries = entries.len(),
        duplicates = pairs.len(),
        groups = groups.len(),
        duration_ms,
        "scan finished"
    );

    Ok(ScanReport {
        entries,
        pairs,
        groups,
        hash_summary,
        errors,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &std::path::Path, rel: &str, content: &[u8]) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_cross_folder_duplicates() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/posters/1.jpg", b"same poster");
        write(temp.path(), "b/posters/2.jpg", b"same poster");
        write(temp.path(), "b/art/3.jpg", b"unique art");

        let report = scan_for_duplicates(
            &[temp.path().to_path_buf()],
            ScanConfig::default(),
            &ContentHasher::new().workers(2),
            &AtomicBool::new(false),
            &null_sender(),
        )
        .unwrap();

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.pairs.len(), 1);
        assert!(report.pairs[0].first_entry.path.ends_with("a/posters/1.jpg"));
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.wasted_bytes(), 11);
    }

    #[test]
    fn cancelled_scan_reports_no_duplicates() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "posters/1.jpg", b"x");
        write(temp.path(), "posters/2.jpg", b"x");

        let report = scan_for_duplicates(
            &[temp.path().to_path_buf()],
            ScanConfig::default(),
            &ContentHasher::new(),
            &AtomicBool::new(true),
            &null_sender(),
        )
        .unwrap();

        assert_eq!(report.entries.len(), 2);
        assert!(report.hash_summary.cancelled);
        assert!(report.pairs.is_empty());
    }
}
