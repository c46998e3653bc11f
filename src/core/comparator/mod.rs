//! # Comparator Module
//!
//! Finds byte-identical artwork by content hash.
//!
//! ## How It Works
//! 1. Walk entries in discovery order
//! 2. Remember the first entry seen for each hash
//! 3. Every later entry with that hash is reported against the first one
//!
//! Reporting is pairwise: three entries sharing a hash give two pairs, both
//! anchored on the first entry. The first entry is never reported as a
//! duplicate. Entries without a hash are ignored.
//!
//! [`group_duplicates`] gives the same relation as N-way groups.

mod grouper;

pub use grouper::{group_duplicates, DuplicateGroup};

use crate::core::hasher::ContentHash;
use crate::core::scanner::ArtworkEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A later entry whose bytes match an earlier one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// The first entry discovered with this content
    pub first_entry: ArtworkEntry,
    /// An entry discovered later with identical content
    pub duplicate_entry: ArtworkEntry,
}

/// Report every entry whose hash was already seen, paired with the first entry that had it
pub fn find_duplicates(entries: &[ArtworkEntry]) -> Vec<DuplicatePair> {
    let mut first_seen: HashMap<ContentHash, &ArtworkEntry> = HashMap::new();
    let mut pairs = Vec::new();

    for entry in entries {
        let Some(hash) = entry.content_hash else {
            continue;
        };

        match first_seen.get(&hash) {
            Some(first) => pairs.push(DuplicatePair {
                first_entry: (*first).clone(),
                duplicate_entry: entry.clone(),
            }),
            None => {
                first_seen.insert(hash, entry);
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::ArtworkCategory;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn entry(name: &str, content: Option<&[u8]>) -> ArtworkEntry {
        let mut entry = ArtworkEntry::new(
            PathBuf::from(format!("/meta/posters/{}", name)),
            ArtworkCategory::Poster,
            10,
            SystemTime::UNIX_EPOCH,
        );
        entry.content_hash = content.map(ContentHash::from_bytes);
        entry
    }

    #[test]
    fn empty_input_has_no_pairs() {
        assert!(find_duplicates(&[]).is_empty());
    }

    #[test]
    fn reports_one_pair_for_two_matches() {
        let entries = vec![
            entry("a.jpg", Some(b"h1")),
            entry("b.jpg", Some(b"h1")),
            entry("c.jpg", Some(b"h2")),
        ];

        let pairs = find_duplicates(&entries);

        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].first_entry.path.ends_with("a.jpg"));
        assert!(pairs[0].duplicate_entry.path.ends_with("b.jpg"));
        assert!(pairs
            .iter()
            .all(|p| !p.first_entry.path.ends_with("c.jpg")
                && !p.duplicate_entry.path.ends_with("c.jpg")));
    }

    #[test]
    fn three_way_match_anchors_on_first() {
        let entries = vec![
            entry("a.jpg", Some(b"same")),
            entry("b.jpg", Some(b"same")),
            entry("c.jpg", Some(b"same")),
        ];

        let pairs = find_duplicates(&entries);

        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.first_entry.path.ends_with("a.jpg")));
        assert!(pairs[1].duplicate_entry.path.ends_with("c.jpg"));
    }

    #[test]
    fn discovery_order_decides_first() {
        let entries = vec![entry("z.jpg", Some(b"x")), entry("a.jpg", Some(b"x"))];

        let pairs = find_duplicates(&entries);

        assert!(pairs[0].first_entry.path.ends_with("z.jpg"));
    }

    #[test]
    fn unhashed_entries_never_match() {
        let entries = vec![entry("a.jpg", None), entry("b.jpg", None)];
        assert!(find_duplicates(&entries).is_empty());
    }
}
