//! Streaming content hash over a file's bytes.

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use xxhash_rust::xxh3::{xxh3_128, Xxh3};

/// Read size for streaming. Does not affect the resulting hash.
pub const CHUNK_SIZE: usize = 4096;

/// 128-bit identity of a file's content.
///
/// Two files with the same bytes always share a hash; a collision is
/// treated as identical content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentHash(u128);

impl ContentHash {
    /// Hash an in-memory buffer
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxh3_128(data))
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// 32 lowercase hex characters
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[derive(Debug, Error)]
#[error("invalid content hash: {0:?}")]
pub struct InvalidContentHash(String);

impl FromStr for ContentHash {
    type Err = InvalidContentHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(InvalidContentHash(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| InvalidContentHash(s.to_string()))
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = InvalidContentHash;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Hash every byte of a file.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
    hash_file_cancellable(path, &AtomicBool::new(false))
}

/// Hash every byte of a file, giving up between chunks once `cancel` is set.
pub fn hash_file_cancellable(path: &Path, cancel: &AtomicBool) -> Result<ContentHash, HashError> {
    let io_err = |source| HashError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Xxh3::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(HashError::Cancelled);
        }
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_err(e)),
        }
    }

    Ok(ContentHash(hasher.digest128()))
}
