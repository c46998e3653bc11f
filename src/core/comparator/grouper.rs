//! Groups entries sharing a content hash into N-way duplicate groups.

use crate::core::hasher::ContentHash;
use crate::core::scanner::ArtworkEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Two or more entries with identical content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub hash: ContentHash,
    /// Members in discovery order; the first is the one to keep
    pub entries: Vec<ArtworkEntry>,
    /// Bytes reclaimable by deleting every member but the first
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// The entry discovered first
    pub fn keeper(&self) -> &ArtworkEntry {
        &self.entries[0]
    }

    /// Every member except the keeper
    pub fn duplicates(&self) -> &[ArtworkEntry] {
        &self.entries[1..]
    }
}

/// Build groups in order of each hash's first appearance.
///
/// Only hashes seen at least twice form a group.
pub fn group_duplicates(entries: &[ArtworkEntry]) -> Vec<DuplicateGroup> {
    let mut index: HashMap<ContentHash, usize> = HashMap::new();
    let mut buckets: Vec<(ContentHash, Vec<&ArtworkEntry>)> = Vec::new();

    for entry in entries {
        let Some(hash) = entry.content_hash else {
            continue;
        };
        let slot = *index.entry(hash).or_insert_with(|| {
            buckets.push((hash, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(entry);
    }

    buckets
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(hash, members)| DuplicateGroup {
            hash,
            wasted_bytes: members.iter().skip(1).map(|e| e.size).sum(),
            entries: members.into_iter().cloned().collect(),
        })
        .collect()
}
