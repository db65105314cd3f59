//! Where the settings files live.
//!
//! ```text
//! <config-dir>/config.json            canonical document
//! <config-dir>/config.json.backup     last known-good snapshot
//! <config-dir>/.config.lock           exclusive-access marker (holder PID)
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::StorageError;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const BACKUP_FILE_NAME: &str = "config.json.backup";
pub const LOCK_FILE_NAME: &str = ".config.lock";

/// Name of the probe file written and removed by [`ConfigPaths::ensure_directory`].
const WRITE_PROBE_NAME: &str = ".test_write";

/// Environment variable overriding the settings directory.
pub const CONFIG_DIR_ENV: &str = "VRITRA_CONFIG_DIR";

/// The three file paths derived from one settings directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub dir: PathBuf,
    pub config_file: PathBuf,
    pub backup_file: PathBuf,
    pub lock_file: PathBuf,
}

impl ConfigPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            config_file: dir.join(CONFIG_FILE_NAME),
            backup_file: dir.join(BACKUP_FILE_NAME),
            lock_file: dir.join(LOCK_FILE_NAME),
            dir,
        }
    }

    /// Creates the directory if needed and proves it is writable by writing
    /// and deleting a small probe file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] naming the step that failed.
    pub fn ensure_directory(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;

        let probe = self.dir.join(WRITE_PROBE_NAME);
        let written = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&probe)
            .and_then(|mut file| file.write_all(b"test"));
        let removed = fs::remove_file(&probe);

        written.map_err(|e| StorageError::io(&probe, e))?;
        removed.map_err(|e| StorageError::io(&probe, e))
    }
}

/// Resolves the default settings directory.
///
/// Order of precedence:
/// 1. `$VRITRA_CONFIG_DIR` if set and non-empty.
/// 2. `<home>/.config-vritrasecz/vritraai`, where `<home>` is `$HOME`
///    (or `%USERPROFILE%` on Windows).
/// 3. `./.config-vritrasecz/vritraai` when no home directory is known.
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config-vritrasecz")
        .join("vritraai")
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}

/// Returns the directory containing `path`, or `.` for a bare file name.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
