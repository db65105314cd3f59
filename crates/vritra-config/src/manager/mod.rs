//! The configuration facade: the only type the rest of the shell talks to.
//!
//! ```text
//!   get_value / set_value / update_values / reset_to_defaults
//!                         │
//!                   ConfigManager ── ReentrantMutex (threads in this process)
//!                    │          │
//!              ConfigCache   FileLock (other processes)
//!                               │
//!                        config.json / config.json.backup
//! ```
//!
//! Reads never fail: a missing, corrupt, or locked file degrades to the
//! backup, the cache, or the default document, in that order, with a
//! warning in the log.  Writes return a [`ConfigError`].
//!
//! The in-process mutex is reentrant, so code running inside
//! [`ConfigManager::update_with`] may call back into the same manager on the
//! same thread.  Nested calls reuse the outer call's file lock.  A nested
//! write is kept: the outer edits are layered over what it saved.

mod cache;
mod options;

pub use cache::ConfigCache;
pub use options::ManagerOptions;

use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::ReentrantMutex;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use vritra_config_core::{
    coerce_enums, default_document, is_metadata_key, keys, merge_with_defaults, validate_document,
    ConfigDocument, ConfigValue, DocumentError,
};

use crate::error::ConfigError;
use crate::infrastructure::lock::{FileLock, LockError, LockGuard, ProcessProbe, SystemProcessProbe};
use crate::infrastructure::storage::{write_atomic, BackupStore, ConfigPaths};

// ── Public result types ───────────────────────────────────────────────────────

/// Where a loaded document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    /// Served from the in-memory cache without touching disk.
    Cache,
    /// Read from the canonical file.
    Disk,
    /// The canonical file was corrupt and the backup was copied over it.
    RestoredFromBackup,
    /// No canonical file existed; defaults were written.
    Created,
    /// Canonical file and backup were both unusable; defaults were written.
    Reset,
    /// Disk was unavailable (lock timeout, read error, unusable directory);
    /// the last cached document or the defaults were returned.
    Fallback,
}

/// A document together with its [`LoadSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub document: ConfigDocument,
    pub source: LoadSource,
}

/// Summary returned by [`ConfigManager::get_config_info`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigInfo {
    pub config_file: PathBuf,
    pub backup_file: PathBuf,
    pub config_exists: bool,
    pub backup_exists: bool,
    pub config_version: Option<String>,
    pub created_timestamp: Option<f64>,
    pub last_updated: Option<f64>,
    pub update_count: u64,
    pub cache_valid: bool,
}

// ── Internal state ────────────────────────────────────────────────────────────

/// State guarded by the reentrant mutex.
///
/// `ReentrantMutex` only hands out shared references, so mutation goes
/// through `RefCell`/`Cell`.  Borrows are kept to single statements so a
/// re-entrant call never finds the cache already borrowed.
struct ManagerState {
    cache: RefCell<ConfigCache>,
    /// How many nested calls on the owning thread currently hold the file lock.
    lock_depth: Cell<u32>,
    /// Bumped on every successful save.
    saves: Cell<u64>,
}

/// Keeps the file lock for the outermost caller and tracks nesting depth.
struct HeldLock<'a> {
    depth: &'a Cell<u32>,
    _guard: Option<LockGuard<'a>>,
}

impl Drop for HeldLock<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

enum DiskRead {
    Missing,
    Valid(ConfigDocument),
    Corrupt(DocumentError),
}

// ── ConfigManager ─────────────────────────────────────────────────────────────

/// Thread-safe, process-safe access to the settings file.
///
/// Construct one per settings directory and share it (for example behind an
/// `Arc`).  Several managers, in one process or many, may point at the same
/// directory; the file lock keeps their writes from interleaving.
pub struct ConfigManager {
    paths: ConfigPaths,
    app_version: Option<String>,
    lock: FileLock,
    backup: BackupStore,
    directory_usable: bool,
    state: ReentrantMutex<ManagerState>,
}

impl ConfigManager {
    /// Creates a manager and prepares its directory.
    ///
    /// Never fails.  If the directory cannot be created or written, the
    /// problem is logged once and the manager serves in-memory defaults;
    /// every write then returns [`ConfigError::DirectoryUnavailable`].
    pub fn new(options: ManagerOptions) -> Self {
        Self::with_probe(options, Arc::new(SystemProcessProbe))
    }

    /// Like [`ConfigManager::new`] with a custom process liveness probe for
    /// stale-lock detection.
    pub fn with_probe(options: ManagerOptions, probe: Arc<dyn ProcessProbe>) -> Self {
        let paths = ConfigPaths::new(options.config_dir);
        let directory_usable = match paths.ensure_directory() {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "configuration directory {} unusable, running on in-memory defaults: {e}",
                    paths.dir.display()
                );
                false
            }
        };

        Self {
            lock: FileLock::with_probe(&paths.lock_file, options.lock, probe),
            backup: BackupStore::new(&paths.config_file, &paths.backup_file),
            app_version: options.app_version,
            directory_usable,
            state: ReentrantMutex::new(ManagerState {
                cache: RefCell::new(ConfigCache::new(options.cache_ttl)),
                lock_depth: Cell::new(0),
                saves: Cell::new(0),
            }),
            paths,
        }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// Returns the current settings document.
    ///
    /// With `use_cache`, a document loaded or saved within the cache TTL is
    /// returned without touching disk.
    pub fn load_config(&self, use_cache: bool) -> ConfigDocument {
        self.load_config_detailed(use_cache).document
    }

    /// Like [`ConfigManager::load_config`], also reporting where the
    /// document came from.
    pub fn load_config_detailed(&self, use_cache: bool) -> Loaded {
        let state = self.state.lock();

        if use_cache {
            if let Some(doc) = state.cache.borrow().fresh() {
                return Loaded {
                    document: doc.clone(),
                    source: LoadSource::Cache,
                };
            }
        }

        if !self.directory_usable {
            return self.fallback(&state);
        }

        let _held = match self.hold_file_lock(&state) {
            Ok(held) => held,
            Err(e) => {
                warn!("{}; using cached or default configuration", ConfigError::from(e));
                return self.fallback(&state);
            }
        };

        match self.read_locked(&state) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("{e}; using cached or default configuration");
                self.fallback(&state)
            }
        }
    }

    /// Returns the value stored under `key`, or `default` if the key is absent.
    pub fn get_value(&self, key: &str, default: impl Into<ConfigValue>) -> ConfigValue {
        self.load_config(true).get_or(key, default.into())
    }

    /// Reports file locations, metadata, and cache state.
    pub fn get_config_info(&self) -> ConfigInfo {
        let state = self.state.lock();
        let doc = self.load_config(true);
        let cache_valid = state.cache.borrow().is_fresh();

        ConfigInfo {
            config_file: self.paths.config_file.clone(),
            backup_file: self.paths.backup_file.clone(),
            config_exists: self.paths.config_file.is_file(),
            backup_exists: self.backup.exists(),
            config_version: doc.config_version().map(str::to_owned),
            created_timestamp: doc.created_timestamp(),
            last_updated: doc.last_updated(),
            update_count: doc.update_count(),
            cache_valid,
        }
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    /// Validates and persists `doc` as the new canonical document.
    ///
    /// Metadata (`_last_updated`, `_update_count`, and friends) is stamped by
    /// the manager; whatever the caller put there is overwritten.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DirectoryUnavailable`] in in-memory mode.
    /// - [`ConfigError::LockTimeout`] / [`ConfigError::Lock`] if exclusive
    ///   access was not obtained.
    /// - [`ConfigError::InvalidDocument`] if a required key is missing.
    /// - [`ConfigError::WriteFailure`] if the backup or the replace failed.
    pub fn save_config(&self, doc: &ConfigDocument) -> Result<(), ConfigError> {
        let state = self.state.lock();
        self.ensure_writable()?;
        let _held = self.hold_file_lock(&state)?;

        self.persist_locked(&state, doc.clone()).map(|_| ())
    }

    /// Stores one value.
    ///
    /// Returns `Ok(false)` without writing when `key` already holds `value`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ReservedKey`] for metadata keys, otherwise as
    /// [`ConfigManager::update_with`].
    pub fn set_value(
        &self,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Result<bool, ConfigError> {
        let change: (String, ConfigValue) = (key.into(), value.into());
        self.update_values([change])
    }

    /// Stores several values in one save.
    ///
    /// Returns `Ok(false)` without writing when every key already holds its
    /// new value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ReservedKey`] if any key is a metadata key (nothing is
    /// written), otherwise as [`ConfigManager::update_with`].
    pub fn update_values<K, V>(
        &self,
        changes: impl IntoIterator<Item = (K, V)>,
    ) -> Result<bool, ConfigError>
    where
        K: Into<String>,
        V: Into<ConfigValue>,
    {
        let changes: Vec<(String, ConfigValue)> = changes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if let Some((key, _)) = changes.iter().find(|(key, _)| is_metadata_key(key)) {
            return Err(ConfigError::ReservedKey(key.clone()));
        }

        self.update_with(|doc| {
            for (key, value) in changes {
                doc.insert(key, value);
            }
        })
    }

    /// Read-modify-write under one file-lock hold.
    ///
    /// The current document is read from disk (not the cache) while the lock
    /// is held, so a change made by another process a moment ago is never
    /// overwritten.  `mutate` edits a copy.  If `mutate` itself saved through
    /// this manager, the copy's edits are re-applied on top of that save.  If
    /// the result, with unknown enum values coerced, equals what is on disk,
    /// nothing is written and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DirectoryUnavailable`] in in-memory mode.
    /// - [`ConfigError::LockTimeout`] / [`ConfigError::Lock`].
    /// - [`ConfigError::Io`] if the canonical file exists but cannot be read.
    /// - [`ConfigError::InvalidDocument`] if `mutate` removed a required key.
    /// - [`ConfigError::WriteFailure`].
    pub fn update_with<F>(&self, mutate: F) -> Result<bool, ConfigError>
    where
        F: FnOnce(&mut ConfigDocument),
    {
        let state = self.state.lock();
        self.ensure_writable()?;
        let _held = self.hold_file_lock(&state)?;

        let read = self.read_locked(&state)?.document;
        let saves_before = state.saves.get();
        let mut updated = read.clone();
        mutate(&mut updated);

        let current = if state.saves.get() == saves_before {
            read
        } else {
            debug!("configuration saved during update; re-applying edits on top");
            let latest = self.read_locked(&state)?.document;
            updated = reapply_edits(&read, &updated, latest.clone());
            latest
        };

        for change in coerce_enums(&mut updated) {
            warn!(
                "`{}` set to \"{}\"; the given value is not recognised",
                change.key, change.replacement
            );
        }

        if updated == current {
            debug!("configuration unchanged; skipping write");
            return Ok(false);
        }
        self.persist_locked(&state, updated)?;
        Ok(true)
    }

    /// Replaces the settings with a fresh default document.
    ///
    /// The previous document is kept in the backup file.
    ///
    /// # Errors
    ///
    /// As [`ConfigManager::save_config`].
    pub fn reset_to_defaults(&self) -> Result<(), ConfigError> {
        let state = self.state.lock();
        self.ensure_writable()?;
        let _held = self.hold_file_lock(&state)?;

        self.persist_locked(&state, self.fresh_defaults())?;
        info!("configuration reset to defaults");
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn ensure_writable(&self) -> Result<(), ConfigError> {
        if self.directory_usable {
            Ok(())
        } else {
            Err(ConfigError::DirectoryUnavailable {
                path: self.paths.dir.clone(),
            })
        }
    }

    /// Takes the file lock unless an outer call on this thread already has it.
    fn hold_file_lock<'a>(&'a self, state: &'a ManagerState) -> Result<HeldLock<'a>, LockError> {
        let guard = if state.lock_depth.get() == 0 {
            Some(self.lock.acquire()?)
        } else {
            None
        };
        state.lock_depth.set(state.lock_depth.get() + 1);
        Ok(HeldLock {
            depth: &state.lock_depth,
            _guard: guard,
        })
    }

    fn read_canonical(&self) -> Result<DiskRead, ConfigError> {
        let path = &self.paths.config_file;
        match fs::read(path) {
            Ok(bytes) => Ok(match ConfigDocument::from_slice(&bytes) {
                Ok(doc) => DiskRead::Valid(doc),
                Err(e) => DiskRead::Corrupt(e),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DiskRead::Missing),
            Err(source) => Err(ConfigError::Io {
                path: path.clone(),
                source,
            }),
        }
    }

    /// Loads from disk with the full recovery chain.  Caller holds the lock.
    ///
    /// Only an unreadable canonical file or a failed write of fresh defaults
    /// is reported as an error.
    fn read_locked(&self, state: &ManagerState) -> Result<Loaded, ConfigError> {
        let (loaded, source) = match self.read_canonical()? {
            DiskRead::Valid(doc) => (doc, LoadSource::Disk),
            DiskRead::Missing => {
                info!(
                    "no configuration at {}; writing defaults",
                    self.paths.config_file.display()
                );
                let document = self.persist_locked(state, self.fresh_defaults())?;
                return Ok(Loaded {
                    document,
                    source: LoadSource::Created,
                });
            }
            DiskRead::Corrupt(source) => {
                warn!(
                    "{}",
                    ConfigError::DocumentCorrupt {
                        path: self.paths.config_file.clone(),
                        source,
                    }
                );
                match self.restore_from_backup()? {
                    Some(doc) => (doc, LoadSource::RestoredFromBackup),
                    None => {
                        let document = self.reset_corrupt_locked(state)?;
                        return Ok(Loaded {
                            document,
                            source: LoadSource::Reset,
                        });
                    }
                }
            }
        };

        let mut document = merge_with_defaults(&default_document(), &loaded);
        self.fill_version(&mut document);
        state.cache.borrow_mut().store(document.clone());
        Ok(Loaded { document, source })
    }

    /// One restore attempt followed by one re-read.
    fn restore_from_backup(&self) -> Result<Option<ConfigDocument>, ConfigError> {
        match self.backup.restore() {
            Ok(true) => {}
            Ok(false) => {
                debug!("no usable configuration backup");
                return Ok(None);
            }
            Err(e) => {
                warn!("configuration backup restore failed: {e}");
                return Ok(None);
            }
        }

        match self.read_canonical()? {
            DiskRead::Valid(doc) => {
                info!(
                    "restored configuration from {}",
                    self.backup.path().display()
                );
                Ok(Some(doc))
            }
            _ => {
                warn!("configuration still unusable after restoring backup");
                Ok(None)
            }
        }
    }

    fn reset_corrupt_locked(&self, state: &ManagerState) -> Result<ConfigDocument, ConfigError> {
        let path = &self.paths.config_file;
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("could not remove corrupt configuration {}: {e}", path.display());
            }
        }
        warn!("configuration and backup unusable; resetting to defaults");
        self.persist_locked(state, self.fresh_defaults())
    }

    /// Validate, snapshot, stamp, replace, cache.  Caller holds the lock.
    fn persist_locked(
        &self,
        state: &ManagerState,
        mut doc: ConfigDocument,
    ) -> Result<ConfigDocument, ConfigError> {
        validate_document(&doc).map_err(ConfigError::InvalidDocument)?;
        for change in coerce_enums(&mut doc) {
            warn!(
                "saving `{}` as \"{}\"; the given value is not recognised",
                change.key, change.replacement
            );
        }

        self.backup.snapshot()?;
        self.stamp_metadata(&mut doc);

        if let Err(e) = write_atomic(&self.paths.config_file, &doc) {
            error!("failed to save configuration: {e}");
            return Err(e.into());
        }
        debug!(
            "saved configuration (update #{}) to {}",
            doc.update_count(),
            self.paths.config_file.display()
        );
        state.cache.borrow_mut().store(doc.clone());
        state.saves.set(state.saves.get() + 1);
        Ok(doc)
    }

    fn stamp_metadata(&self, doc: &mut ConfigDocument) {
        let now = epoch_seconds();
        if let Some(version) = &self.app_version {
            doc.insert(keys::CONFIG_VERSION, version.as_str());
        }
        if doc.created_timestamp().is_none() {
            doc.insert(keys::CREATED_TIMESTAMP, now);
        }
        doc.insert(keys::LAST_UPDATED, now);
        let count = doc.update_count().saturating_add(1);
        doc.insert(
            keys::UPDATE_COUNT,
            ConfigValue::Integer(i64::try_from(count).unwrap_or(i64::MAX)),
        );
    }

    fn fill_version(&self, doc: &mut ConfigDocument) {
        let Some(version) = &self.app_version else {
            return;
        };
        if doc.config_version().map_or(true, str::is_empty) {
            doc.insert(keys::CONFIG_VERSION, version.as_str());
        }
    }

    fn fresh_defaults(&self) -> ConfigDocument {
        let mut doc = default_document();
        doc.insert(keys::CREATED_TIMESTAMP, epoch_seconds());
        self.fill_version(&mut doc);
        doc
    }

    fn fallback(&self, state: &ManagerState) -> Loaded {
        let cached = state.cache.borrow().latest().cloned();
        let document = cached.unwrap_or_else(|| {
            let mut doc = default_document();
            self.fill_version(&mut doc);
            doc
        });
        Loaded {
            document,
            source: LoadSource::Fallback,
        }
    }
}

/// Applies the difference between `before` and `edited` to `onto`.
fn reapply_edits(
    before: &ConfigDocument,
    edited: &ConfigDocument,
    mut onto: ConfigDocument,
) -> ConfigDocument {
    for (key, value) in edited {
        if before.get(key) != Some(value) {
            onto.insert(key.clone(), value.clone());
        }
    }
    for (key, _) in before {
        if !edited.contains_key(key) {
            onto.remove(key);
        }
    }
    onto
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
