//! # Scanner Module
//!
//! Discovers artwork files on a local filesystem.
//!
//! Discovery adapters hand the rest of the engine a flat list of
//! [`ArtworkEntry`] values; nothing downstream cares where they came from.
//! [`WalkDirScanner`] is the local adapter: it walks directories and
//! classifies each image by the folder it sits in (`posters/`, `art/`, ...).
//!
//! ## Example
//! ```rust,ignore
//! use artwork_vault::core::scanner::{ArtworkScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["/var/lib/plex/Metadata".into()])?;
//! ```

mod filter;
mod walker;

pub use filter::ArtworkFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::core::hasher::ContentHash;
use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A discovered artwork file.
///
/// Lives for one scan. `content_hash` is filled in by the hasher and stays
/// `None` for files that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkEntry {
    pub path: PathBuf,
    pub category: ArtworkCategory,
    /// File size in bytes
    pub size: u64,
    pub modified: SystemTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
}

impl ArtworkEntry {
    pub fn new(
        path: impl Into<PathBuf>,
        category: ArtworkCategory,
        size: u64,
        modified: SystemTime,
    ) -> Self {
        Self {
            path: path.into(),
            category,
            size,
            modified,
            content_hash: None,
        }
    }

    /// Build an entry from filesystem metadata, classifying it by its parent folder
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self::new(
            path,
            ArtworkCategory::from_parent(path),
            metadata.len(),
            metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        ))
    }

    /// Attach an already-known hash
    pub fn with_hash(mut self, hash: ContentHash) -> Self {
        self.content_hash = Some(hash);
        self
    }
}

/// Logical kind of artwork, as media servers lay them out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkCategory {
    Poster,
    Art,
    Banner,
    Theme,
    Background,
    Other,
}

impl ArtworkCategory {
    /// Classify from a folder name such as `posters` or `Backgrounds`
    pub fn from_folder(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "posters" | "poster" => Self::Poster,
            "art" => Self::Art,
            "banners" | "banner" => Self::Banner,
            "themes" | "theme" => Self::Theme,
            "backgrounds" | "background" => Self::Background,
            _ => Self::Other,
        }
    }

    /// Classify from the name of the directory containing `path`
    pub fn from_parent(path: &Path) -> Self {
        path.parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(Self::from_folder)
            .unwrap_or(Self::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poster => "poster",
            Self::Art => "art",
            Self::Banner => "banner",
            Self::Theme => "theme",
            Self::Background => "background",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ArtworkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a discovery pass
#[derive(Debug)]
pub struct ScanResult {
    /// Entries in discovery order
    pub entries: Vec<ArtworkEntry>,
    /// Non-fatal errors met along the way
    pub errors: Vec<ScanError>,
}

/// Trait for discovery adapters
pub trait ArtworkScanner: Send + Sync {
    /// Discover artwork under the given roots
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError>;

    /// Discover with progress reporting via events
    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_folder_is_case_insensitive() {
        assert_eq!(ArtworkCategory::from_folder("posters"), ArtworkCategory::Poster);
        assert_eq!(ArtworkCategory::from_folder("Backgrounds"), ArtworkCategory::Background);
        assert_eq!(ArtworkCategory::from_folder("ART"), ArtworkCategory::Art);
    }

    #[test]
    fn unknown_folder_is_other() {
        assert_eq!(ArtworkCategory::from_folder("thumbs"), ArtworkCategory::Other);
    }

    #[test]
    fn category_from_parent_uses_directory_name() {
        let path = Path::new("/meta/Show.bundle/Contents/_combined/banners/abc.jpg");
        assert_eq!(ArtworkCategory::from_parent(path), ArtworkCategory::Banner);
    }

    #[test]
    fn from_path_reads_size() {
        let dir = tempfile::TempDir::new().unwrap();
        let themes = dir.path().join("themes");
        fs::create_dir(&themes).unwrap();
        let path = themes.join("intro.jpg");
        fs::write(&path, b"0123456789").unwrap();

        let entry = ArtworkEntry::from_path(&path).unwrap();

        assert_eq!(entry.size, 10);
        assert_eq!(entry.category, ArtworkCategory::Theme);
        assert!(entry.content_hash.is_none());
    }
}
