//! One-generation backup of the canonical settings file.
//!
//! The backup trails the canonical file by exactly one save: every save
//! snapshots the current canonical file first, then replaces it.  If the
//! canonical file is later found corrupt, [`BackupStore::restore`] copies the
//! backup back.
//!
//! Both directions go through the atomic writer, so neither file is ever
//! observed half-copied.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use vritra_config_core::ConfigDocument;

use super::atomic::write_bytes_atomic;
use super::StorageError;

/// Copies between the canonical file and its backup.
#[derive(Debug, Clone)]
pub struct BackupStore {
    canonical: PathBuf,
    backup: PathBuf,
}

impl BackupStore {
    pub fn new(canonical: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            canonical: canonical.into(),
            backup: backup.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.backup
    }

    pub fn exists(&self) -> bool {
        self.backup.is_file()
    }

    /// Copies the canonical file to the backup path.
    ///
    /// Returns `Ok(false)` without touching the backup when there is nothing
    /// worth keeping: the canonical file is missing or does not hold a valid
    /// document.  A corrupt canonical file never overwrites a good backup.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if reading the canonical file or writing
    /// the backup fails.
    pub fn snapshot(&self) -> Result<bool, StorageError> {
        let Some(bytes) = read_optional(&self.canonical)? else {
            return Ok(false);
        };
        if let Err(e) = ConfigDocument::from_slice(&bytes) {
            warn!(
                "not backing up {}: current content is invalid ({e})",
                self.canonical.display()
            );
            return Ok(false);
        }

        write_bytes_atomic(&self.backup, &bytes)?;
        debug!("snapshotted configuration to {}", self.backup.display());
        Ok(true)
    }

    /// Copies the backup over the canonical file.
    ///
    /// Returns `Ok(false)` when there is no backup or the backup is itself
    /// invalid; the canonical file is then left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if reading the backup or writing the
    /// canonical file fails.
    pub fn restore(&self) -> Result<bool, StorageError> {
        let Some(bytes) = read_optional(&self.backup)? else {
            return Ok(false);
        };
        if let Err(e) = ConfigDocument::from_slice(&bytes) {
            warn!("backup {} is unusable: {e}", self.backup.display());
            return Ok(false);
        }

        write_bytes_atomic(&self.canonical, &bytes)?;
        Ok(true)
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
