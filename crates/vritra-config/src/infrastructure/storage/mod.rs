//! On-disk layout, atomic replacement, and the one-generation backup.

pub mod atomic;
pub mod backup;
pub mod paths;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vritra_config_core::DocumentError;

pub use atomic::{write_atomic, write_bytes_atomic};
pub use backup::BackupStore;
pub use paths::{default_config_dir, ConfigPaths};

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not serialize configuration document: {0}")]
    Serialize(#[from] DocumentError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
