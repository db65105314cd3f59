//! # vritra-config
//!
//! Crash-safe settings persistence for the VritraAI shell.
//!
//! The shell stores its settings in one JSON file that several shell
//! instances (and several threads inside each instance) may read and write
//! at the same time.  This crate makes sure that file is never seen
//! half-written, that concurrent writers do not lose each other's changes,
//! and that a corrupt file never stops the shell from starting.
//!
//! # Quick start
//!
//! ```no_run
//! use vritra_config::{ConfigManager, ManagerOptions};
//!
//! let manager = ConfigManager::new(ManagerOptions::default().with_app_version("0.30.5"));
//!
//! let theme = manager.get_value("theme", "dark");
//! println!("current theme: {theme}");
//!
//! if let Err(e) = manager.set_value("theme", "matrix") {
//!     eprintln!("theme not saved: {e}");
//! }
//! ```
//!
//! # Modules
//!
//! - **`manager`** – [`ConfigManager`], the facade: in-process mutex, cache,
//!   load / save / get / set / update / reset.
//! - **`infrastructure::lock`** – [`FileLock`], cross-process exclusion
//!   through an exclusively created marker file.
//! - **`infrastructure::storage`** – Directory layout, atomic writer, and
//!   the one-generation backup.
//! - **`error`** – [`ConfigError`].
//!
//! The document model and validation rules come from `vritra-config-core`
//! and are re-exported here.

pub mod error;
pub mod infrastructure;
pub mod manager;

pub use error::ConfigError;
pub use infrastructure::lock::{FileLock, LockError, LockGuard, LockSettings, ProcessProbe};
pub use infrastructure::storage::{default_config_dir, ConfigPaths, StorageError};
pub use manager::{ConfigInfo, ConfigManager, LoadSource, Loaded, ManagerOptions};

pub use vritra_config_core::{keys, ConfigDocument, ConfigValue, DocumentError};
