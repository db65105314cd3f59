//! Crash-safe whole-file replacement: write a temporary sibling, `sync_all`
//! it, then `rename` it over the target.  Readers see the old file or the new
//! one, never a mixture.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tracing::warn;
use uuid::Uuid;
use vritra_config_core::ConfigDocument;

use super::paths::parent_dir;
use super::StorageError;

/// Serializes `doc` and atomically replaces `path` with it.
///
/// # Errors
///
/// - [`StorageError::Serialize`] if the document cannot be rendered.
/// - [`StorageError::Io`] for any file system failure.  The target is left
///   untouched and no temporary file remains.
pub fn write_atomic(path: &Path, doc: &ConfigDocument) -> Result<(), StorageError> {
    let text = doc.to_json_pretty()?;
    write_bytes_atomic(path, text.as_bytes())
}

/// Atomically replaces `path` with `bytes`.
///
/// # Errors
///
/// See [`write_atomic`].
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let dir = parent_dir(path);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    let tmp_path = dir.join(format!(".{file_name}.tmp-{}", Uuid::new_v4()));

    let result = write_and_sync(&tmp_path, bytes)
        .and_then(|()| replace(&tmp_path, path))
        .map_err(|e| StorageError::io(path, e));

    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("could not remove temporary file {}: {e}", tmp_path.display());
            }
        }
        return result;
    }

    if let Err(e) = sync_directory(dir) {
        // The rename already happened; only durability of the directory
        // entry is in question.
        warn!("could not fsync directory {}: {e}", dir.display());
    }
    Ok(())
}

fn write_and_sync(tmp_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

#[cfg(not(windows))]
fn replace(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

/// `rename` over an existing file can fail on some Windows file systems; fall
/// back to delete-then-rename, which leaves a short window with no target.
#[cfg(windows)]
fn replace(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(first) if to.is_file() => {
            warn!("atomic rename onto {} failed ({first}); replacing non-atomically", to.display());
            fs::remove_file(to)?;
            fs::rename(from, to)
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> io::Result<()> {
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
