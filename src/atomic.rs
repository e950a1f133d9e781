//! Temp-file-then-rename writes.
//!
//! Readers never observe a half-written file: the bytes go to a temp file in
//! the destination's directory (same filesystem, so the rename is atomic) and
//! only a fully flushed file is moved over the target. On failure the temp
//! file is removed when it is dropped.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Atomically replace `path` with `bytes`.
///
/// The file is created owner-only (`0600` on Unix, which is what
/// `tempfile` uses for its temp files).
pub fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = stage(path, bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write `bytes` to a synced temp file next to `path` without moving it.
///
/// Callers choose between `persist` (replace) and `persist_noclobber`
/// (create-if-absent).
pub fn stage(path: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}
