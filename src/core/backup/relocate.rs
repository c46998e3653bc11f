//! Moving a single file between locations without ever losing it.

use crate::core::hasher::hash_file;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Move `source` to `dest`, overwriting `dest`.
///
/// A plain rename when possible. When rename fails (typically across
/// volumes) the file is copied, the copy is checked against the source by
/// size and content hash, and only then is the source removed. On any
/// failure the source is left in place and the copy is removed.
pub fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                source = %source.display(),
                dest = %dest.display(),
                "rename failed ({}), falling back to copy",
                rename_err
            );
            copy_verify_remove(source, dest)
        }
    }
}

fn copy_verify_remove(source: &Path, dest: &Path) -> io::Result<()> {
    let source_size = fs::metadata(source)?.len();

    if let Err(e) = fs::copy(source, dest) {
        let _ = fs::remove_file(dest);
        return Err(e);
    }

    if let Err(e) = verify_copy(source, dest, source_size) {
        let _ = fs::remove_file(dest);
        return Err(e);
    }

    if let Err(e) = fs::remove_file(source) {
        // Source is still there, so drop the copy rather than keep two
        let _ = fs::remove_file(dest);
        return Err(e);
    }

    Ok(())
}

fn verify_copy(source: &Path, dest: &Path, source_size: u64) -> io::Result<()> {
    let dest_size = fs::metadata(dest)?.len();
    if dest_size != source_size {
        return Err(io::Error::other(format!(
            "copy verification failed: source {} bytes, copy {} bytes",
            source_size, dest_size
        )));
    }

    let (source_hash, dest_hash) = match (hash_file(source), hash_file(dest)) {
        (Ok(s), Ok(d)) => (s, d),
        (Err(e), _) | (_, Err(e)) => return Err(io::Error::other(e.to_string())),
    };
    if source_hash != dest_hash {
        return Err(io::Error::other("copy verification failed: content differs"));
    }

    Ok(())
}
