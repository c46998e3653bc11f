//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Decides which files count as artwork
pub struct ArtworkFilter {
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl ArtworkFilter {
    /// Accept the image types media servers store artwork as
    pub fn new() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "gif", "webp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the list of extensions to accept
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for ArtworkFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_artwork_extensions_in_any_case() {
        let filter = ArtworkFilter::new();
        assert!(filter.should_include(Path::new("/a/poster.jpg")));
        assert!(filter.should_include(Path::new("/a/poster.JPEG")));
        assert!(filter.should_include(Path::new("/a/art.png")));
    }

    #[test]
    fn rejects_metadata_files() {
        let filter = ArtworkFilter::new();
        assert!(!filter.should_include(Path::new("/a/Info.xml")));
        assert!(!filter.should_include(Path::new("/a/README")));
    }

    #[test]
    fn hidden_files_are_opt_in() {
        let path = Path::new("/a/.poster.jpg");
        assert!(!ArtworkFilter::new().should_include(path));
        assert!(ArtworkFilter::new().with_hidden(true).should_include(path));
    }

    #[test]
    fn custom_extensions_replace_defaults() {
        let filter = ArtworkFilter::new().with_extensions(vec!["MP3".to_string()]);
        assert!(filter.should_include(Path::new("/a/theme.mp3")));
        assert!(!filter.should_include(Path::new("/a/poster.jpg")));
    }
}
