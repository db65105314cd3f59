//! Error taxonomy reported by [`crate::ConfigManager`].
//!
//! Reads never return these: a broken settings file must not stop the shell
//! from starting, so `load_config` always produces a document.  Writes return
//! them so callers can tell a refused save from a successful one.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use vritra_config_core::DocumentError;

use crate::infrastructure::lock::LockError;
use crate::infrastructure::storage::StorageError;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings directory could not be created or is not writable.  The
    /// manager runs on in-memory defaults only.
    #[error("configuration directory {path} is not usable")]
    DirectoryUnavailable { path: PathBuf },

    /// The canonical file holds malformed or structurally invalid JSON.
    #[error("configuration file {path} is corrupt: {source}")]
    DocumentCorrupt {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    /// The caller handed over a document that fails validation.
    #[error("refusing to save invalid configuration: {0}")]
    InvalidDocument(#[source] DocumentError),

    /// Another holder kept the configuration lock for the whole wait.
    #[error("timed out after {waited:?} waiting for configuration lock {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    /// The lock marker could not be created or removed.
    #[error("configuration lock failed: {0}")]
    Lock(#[source] LockError),

    /// Snapshot or atomic replace failed.  The canonical file is unchanged.
    #[error("could not write configuration: {0}")]
    WriteFailure(#[from] StorageError),

    /// The canonical file exists but could not be read.
    #[error("I/O error reading configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Metadata keys (`_`-prefixed) are maintained by the manager.
    #[error("`{0}` is managed automatically and cannot be set")]
    ReservedKey(String),
}

impl From<LockError> for ConfigError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Timeout { path, waited } => Self::LockTimeout { path, waited },
            other => Self::Lock(other),
        }
    }
}
