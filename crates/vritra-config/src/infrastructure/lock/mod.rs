//! Cross-process exclusive access to the settings directory.
//!
//! ```text
//! acquire():  create ".config.lock" with create_new(true)
//!               ├─ created  → we own the lock; write our PID into it
//!               └─ exists   → someone else owns it
//!                     ├─ holder is stale (dead PID, garbage, too old) → claim it, retry now
//!                     └─ holder is live → sleep 100ms, 200ms, 400ms, 500ms, ... until timeout
//! release():  delete ".config.lock" (only if it still carries our PID)
//! ```
//!
//! The lock is advisory.  [`FileLock::acquire`] returns a [`LockGuard`] that
//! releases the lock when dropped.
//!
//! Every marker path held by a [`FileLock`] in this process is also recorded
//! in a process-wide registry.  A marker carrying our own PID that is not in
//! the registry was left by an earlier process that had the same PID, and is
//! reclaimed like any other stale marker.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub mod process;

pub use process::{ProcessProbe, SystemProcessProbe};

/// An empty marker younger than this is assumed to be mid-creation (the
/// holder has created the file but not yet written its PID).
const EMPTY_MARKER_GRACE: Duration = Duration::from_millis(250);

/// Marker paths currently held by a [`FileLock`] in this process.
///
/// Creating, releasing and reclaiming a marker all happen under this mutex,
/// so an in-process holder is registered before any other thread can see its
/// marker as orphaned.
static HELD_IN_PROCESS: Mutex<Vec<PathBuf>> = parking_lot::const_mutex(Vec::new());

/// Error type for lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock stayed held by a live process for the whole wait.
    #[error("timed out after {waited:?} waiting for lock {path}")]
    Timeout { path: PathBuf, waited: Duration },

    /// The marker could not be created or removed for a reason other than
    /// contention (missing directory, permissions, ...).
    #[error("I/O error on lock file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Timing parameters for [`FileLock`].
#[derive(Debug, Clone, PartialEq)]
pub struct LockSettings {
    /// Default upper bound on how long [`FileLock::acquire`] waits.
    pub timeout: Duration,
    /// A marker whose holder cannot be checked is stale once it is older
    /// than this.
    pub stale_after: Duration,
    /// First sleep between attempts.  Doubles after each attempt.
    pub initial_backoff: Duration,
    /// Ceiling for the doubling backoff.
    pub max_backoff: Duration,
}

impl Default for LockSettings {
    /// | Field           | Default |
    /// |-----------------|---------|
    /// | timeout         | 5 s     |
    /// | stale_after     | 30 s    |
    /// | initial_backoff | 100 ms  |
    /// | max_backoff     | 500 ms  |
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            stale_after: Duration::from_secs(30),
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
        }
    }
}

/// Why a marker was judged stale.  Used for logging.
#[derive(Debug, Clone, PartialEq)]
enum StaleReason {
    Unreadable,
    Empty,
    NotAPid,
    HolderExited(u32),
    Expired { pid: u32, age: Duration },
    /// Carries our PID but no lock in this process holds it.
    LeftByEarlierProcess(u32),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable => f.write_str("marker unreadable"),
            Self::Empty => f.write_str("marker empty"),
            Self::NotAPid => f.write_str("marker does not hold a PID"),
            Self::HolderExited(pid) => write!(f, "pid {pid} has exited"),
            Self::Expired { pid, age } => write!(f, "pid {pid} unverifiable, marker {age:?} old"),
            Self::LeftByEarlierProcess(pid) => {
                write!(f, "pid {pid} is ours but no lock here holds it")
            }
        }
    }
}

/// What we found when inspecting an existing marker.
#[derive(Debug)]
enum Holder {
    /// A live (or not provably dead) process owns the lock.
    Live(u32),
    /// The marker may be reclaimed.  `observed` is the content we judged,
    /// if it could be read.
    Stale {
        reason: StaleReason,
        observed: Option<String>,
    },
    /// The marker disappeared between our create attempt and the read.
    Vanished,
}

/// A file-based, cross-process exclusive lock.
pub struct FileLock {
    path: PathBuf,
    settings: LockSettings,
    probe: Arc<dyn ProcessProbe>,
    /// Marker content identifying this process.
    token: String,
    /// Whether this instance currently owns the marker.
    held: AtomicBool,
}

impl FileLock {
    /// Creates a lock on `path` using the operating system liveness probe.
    pub fn new(path: impl Into<PathBuf>, settings: LockSettings) -> Self {
        Self::with_probe(path, settings, Arc::new(SystemProcessProbe))
    }

    /// Creates a lock on `path` with a caller-supplied liveness probe.
    pub fn with_probe(
        path: impl Into<PathBuf>,
        settings: LockSettings,
        probe: Arc<dyn ProcessProbe>,
    ) -> Self {
        Self {
            path: path.into(),
            settings,
            probe,
            token: std::process::id().to_string(),
            held: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &LockSettings {
        &self.settings
    }

    /// Acquires the lock, waiting at most [`LockSettings::timeout`].
    ///
    /// # Errors
    ///
    /// See [`FileLock::acquire_within`].
    pub fn acquire(&self) -> Result<LockGuard<'_>, LockError> {
        self.acquire_within(self.settings.timeout)
    }

    /// Acquires the lock, waiting at most `timeout`.
    ///
    /// A zero timeout makes exactly one attempt (plus an immediate retry for
    /// each stale marker reclaimed).
    ///
    /// # Errors
    ///
    /// - [`LockError::Timeout`] if a live holder kept the lock for the whole
    ///   wait.
    /// - [`LockError::Io`] if the marker cannot be created for any reason
    ///   other than "already exists".
    pub fn acquire_within(&self, timeout: Duration) -> Result<LockGuard<'_>, LockError> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut backoff = self.settings.initial_backoff;

        loop {
            match self.try_create() {
                Ok(()) => {
                    debug!("acquired configuration lock {}", self.path.display());
                    return Ok(LockGuard {
                        lock: self,
                        released: false,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(source) => {
                    return Err(LockError::Io {
                        path: self.path.clone(),
                        source,
                    })
                }
            }

            match self.inspect_holder() {
                Holder::Vanished => continue,
                Holder::Stale { reason, observed } => {
                    if self.reclaim(observed.as_deref()) {
                        info!(
                            "reclaimed stale configuration lock {} ({reason})",
                            self.path.display()
                        );
                        continue;
                    }
                }
                Holder::Live(pid) => {
                    debug!("configuration lock held by pid {pid}; backing off {backoff:?}");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(LockError::Timeout {
                    path: self.path.clone(),
                    waited: now - started,
                });
            }
            thread::sleep(backoff.min(deadline - now));
            backoff = (backoff * 2).min(self.settings.max_backoff);
        }
    }

    /// Removes the marker if this lock holds it.
    ///
    /// Idempotent: releasing a lock that is not held is a no-op.  A marker
    /// now carrying a different PID (our lock was reclaimed as stale and
    /// re-taken) is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Io`] if the marker exists, is ours, and cannot be
    /// deleted.
    pub fn release(&self) -> Result<(), LockError> {
        if !self.held.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let key = self.registry_key();
        let mut registry = HELD_IN_PROCESS.lock();
        registry.retain(|held| held != &key);

        match fs::read_to_string(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Ok(content) if content.trim() != self.token => {
                warn!(
                    "configuration lock {} now belongs to {:?}; leaving it in place",
                    self.path.display(),
                    content.trim()
                );
                return Ok(());
            }
            _ => {}
        }

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Exclusive-creates the marker, writes our PID into it and registers it
    /// as held by this process.
    fn try_create(&self) -> io::Result<()> {
        let key = self.registry_key();
        let mut registry = HELD_IN_PROCESS.lock();

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;

        if let Err(e) = file.write_all(self.token.as_bytes()).and_then(|()| file.flush()) {
            drop(file);
            let _ = fs::remove_file(&self.path);
            return Err(e);
        }

        registry.push(key);
        self.held.store(true, Ordering::Release);
        Ok(())
    }

    /// Identity of the marker in the in-process registry.  The directory is
    /// canonicalized so that different spellings of one path agree.
    fn registry_key(&self) -> PathBuf {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        match (fs::canonicalize(dir), self.path.file_name()) {
            (Ok(dir), Some(name)) => dir.join(name),
            _ => self.path.clone(),
        }
    }

    fn held_in_process(&self, registry: &[PathBuf]) -> bool {
        let key = self.registry_key();
        registry.iter().any(|held| held == &key)
    }

    fn inspect_holder(&self) -> Holder {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Holder::Vanished,
            Err(_) => {
                return Holder::Stale {
                    reason: StaleReason::Unreadable,
                    observed: None,
                }
            }
        };

        let age = self.marker_age();
        let trimmed = content.trim();

        if trimmed.is_empty() {
            // A holder that just won create_new may not have written its PID yet.
            if age.is_some_and(|age| age < EMPTY_MARKER_GRACE) {
                return Holder::Live(0);
            }
            return Holder::Stale {
                reason: StaleReason::Empty,
                observed: Some(content),
            };
        }

        let Ok(pid) = trimmed.parse::<u32>() else {
            return Holder::Stale {
                reason: StaleReason::NotAPid,
                observed: Some(content),
            };
        };

        if trimmed == self.token {
            if self.held_in_process(&HELD_IN_PROCESS.lock()) {
                return Holder::Live(pid);
            }
            return Holder::Stale {
                reason: StaleReason::LeftByEarlierProcess(pid),
                observed: Some(content),
            };
        }

        match self.probe.is_alive(pid) {
            Some(true) => Holder::Live(pid),
            Some(false) => Holder::Stale {
                reason: StaleReason::HolderExited(pid),
                observed: Some(content),
            },
            None => match age {
                Some(age) if age > self.settings.stale_after => Holder::Stale {
                    reason: StaleReason::Expired { pid, age },
                    observed: Some(content),
                },
                _ => Holder::Live(pid),
            },
        }
    }

    /// Age of the marker according to its modification time.
    fn marker_age(&self) -> Option<Duration> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO),
        )
    }

    /// Takes a stale marker out of the way, provided it still holds what we
    /// inspected.
    ///
    /// The marker is first renamed to a unique side path, so of several
    /// processes reclaiming the same marker only one ends up with it.  If
    /// what we took turns out not to be the marker we judged (it changed
    /// hands after inspection), it is put back.
    ///
    /// Returns `true` if the marker path is free afterwards.
    fn reclaim(&self, observed: Option<&str>) -> bool {
        let registry = HELD_IN_PROCESS.lock();
        let claimed = self.claim_path();

        match fs::rename(&self.path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
            Err(e) => {
                warn!(
                    "could not claim stale configuration lock {}: {e}",
                    self.path.display()
                );
                return false;
            }
        }

        let content = fs::read_to_string(&claimed).ok();
        let unchanged = match observed {
            Some(expected) => content.as_deref() == Some(expected),
            None => true,
        };
        let held_here = content.as_deref().is_some_and(|c| c.trim() == self.token)
            && self.held_in_process(&registry);

        if unchanged && !held_here {
            if let Err(e) = fs::remove_file(&claimed) {
                warn!("could not remove claimed lock {}: {e}", claimed.display());
            }
            return true;
        }

        self.put_back(&claimed);
        false
    }

    fn claim_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!("{name}.stale-{}", Uuid::new_v4().simple()))
    }

    /// Returns a marker taken by mistake to its place.
    fn put_back(&self, claimed: &Path) {
        match fs::hard_link(claimed, &self.path) {
            Ok(()) => {
                let _ = fs::remove_file(claimed);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(
                    "configuration lock {} was re-created while a live marker was set aside; discarding it",
                    self.path.display()
                );
                let _ = fs::remove_file(claimed);
            }
            // No hard links on this filesystem.
            Err(_) => {
                if let Err(e) = fs::rename(claimed, &self.path) {
                    warn!(
                        "could not restore configuration lock {}: {e}",
                        self.path.display()
                    );
                }
            }
        }
    }
}

/// Proof of holding a [`FileLock`].  Releases the lock when dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    lock: &'a FileLock,
    released: bool,
}

impl LockGuard<'_> {
    /// Releases the lock now, reporting any error instead of logging it.
    ///
    /// # Errors
    ///
    /// See [`FileLock::release`].
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        self.lock.release()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.lock.release() {
                warn!("failed to release configuration lock: {e}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::process::MockProcessProbe;
    use super::*;
    use mockall::predicate::eq;
    use std::fs::File;

    fn fast_settings() -> LockSettings {
        LockSettings {
            timeout: Duration::from_millis(300),
            stale_after: Duration::from_secs(30),
            initial_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(50),
        }
    }

    /// A probe that answers `answer` for every PID.
    fn probe_answering(answer: Option<bool>) -> Arc<dyn ProcessProbe> {
        let mut probe = MockProcessProbe::new();
        probe.expect_is_alive().return_const(answer);
        Arc::new(probe)
    }

    fn backdate(path: &Path, by: Duration) {
        let file = File::options().write(true).open(path).expect("open marker");
        file.set_modified(SystemTime::now() - by)
            .expect("set mtime");
    }

    #[test]
    fn test_acquire_creates_marker_with_own_pid() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let lock = FileLock::new(dir.path().join(".config.lock"), fast_settings());

        // Act
        let guard = lock.acquire().expect("acquire");

        // Assert
        let content = fs::read_to_string(lock.path()).expect("marker exists");
        assert_eq!(content, std::process::id().to_string());
        drop(guard);
    }

    #[test]
    fn test_dropping_guard_removes_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lock = FileLock::new(dir.path().join(".config.lock"), fast_settings());

        {
            let _guard = lock.acquire().expect("acquire");
            assert!(lock.path().exists());
        }

        assert!(!lock.path().exists(), "marker must be removed on drop");
    }

    #[test]
    fn test_second_acquire_times_out_while_live_holder_exists() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        let holder = FileLock::with_probe(&path, fast_settings(), probe_answering(Some(true)));
        let contender = FileLock::with_probe(&path, fast_settings(), probe_answering(Some(true)));
        let _guard = holder.acquire().expect("first acquire");

        // Act
        let started = Instant::now();
        let result = contender.acquire_within(Duration::from_millis(150));
        let elapsed = started.elapsed();

        // Assert
        assert!(matches!(result, Err(LockError::Timeout { .. })));
        assert!(elapsed >= Duration::from_millis(150));
        assert!(
            elapsed < Duration::from_secs(2),
            "backoff must not overshoot the deadline by much, took {elapsed:?}"
        );
    }

    #[test]
    fn test_marker_of_dead_process_is_reclaimed_without_waiting() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, "999999").expect("write marker");
        let mut probe = MockProcessProbe::new();
        probe
            .expect_is_alive()
            .with(eq(999_999))
            .times(1)
            .return_const(Some(false));
        let lock = FileLock::with_probe(&path, fast_settings(), Arc::new(probe));

        // Act – zero timeout: no sleeping allowed
        let guard = lock.acquire_within(Duration::ZERO).expect("stale lock reclaimed");

        // Assert
        let content = fs::read_to_string(&path).expect("marker exists");
        assert_eq!(content, std::process::id().to_string());
        drop(guard);
    }

    #[test]
    fn test_old_marker_is_reclaimed_when_liveness_unknown() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, "4242").expect("write marker");
        backdate(&path, Duration::from_secs(60));
        let lock = FileLock::with_probe(&path, fast_settings(), probe_answering(None));

        // Act / Assert
        assert!(lock.acquire_within(Duration::ZERO).is_ok());
    }

    #[test]
    fn test_fresh_marker_is_respected_when_liveness_unknown() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, "4242").expect("write marker");
        let lock = FileLock::with_probe(&path, fast_settings(), probe_answering(None));

        // Act
        let result = lock.acquire_within(Duration::ZERO);

        // Assert
        assert!(matches!(result, Err(LockError::Timeout { .. })));
        assert_eq!(fs::read_to_string(&path).expect("marker kept"), "4242");
    }

    #[test]
    fn test_garbage_marker_is_reclaimed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, "not-a-pid").expect("write marker");
        let lock = FileLock::with_probe(&path, fast_settings(), probe_answering(Some(true)));

        assert!(lock.acquire_within(Duration::ZERO).is_ok());
    }

    #[test]
    fn test_empty_marker_is_reclaimed_only_after_grace_period() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, "").expect("write marker");
        let lock = FileLock::with_probe(&path, fast_settings(), probe_answering(Some(true)));

        // Act / Assert – brand-new empty marker: holder may still be writing
        assert!(lock.acquire_within(Duration::ZERO).is_err());

        // Act / Assert – same marker, now old
        backdate(&path, Duration::from_secs(5));
        assert!(lock.acquire_within(Duration::ZERO).is_ok());
    }

    #[test]
    fn test_release_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lock = FileLock::new(dir.path().join(".config.lock"), fast_settings());

        let guard = lock.acquire().expect("acquire");
        guard.release().expect("first release");

        assert!(lock.release().is_ok(), "second release must be a no-op");
        assert!(!lock.path().exists());
    }

    #[test]
    fn test_release_leaves_marker_owned_by_another_process() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, "31337").expect("write marker");
        let lock = FileLock::new(&path, fast_settings());

        // Act
        lock.release().expect("release");

        // Assert
        assert_eq!(fs::read_to_string(&path).expect("marker kept"), "31337");
    }

    #[test]
    fn test_release_of_idle_lock_leaves_sibling_holder_marker() {
        // Arrange – two locks on one path in this process
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        let holder = FileLock::new(&path, fast_settings());
        let idle = FileLock::new(&path, fast_settings());
        let guard = holder.acquire().expect("acquire");

        // Act
        idle.release().expect("release");

        // Assert
        assert!(path.exists(), "marker of the holder must survive");
        drop(guard);
        assert!(!path.exists());
    }

    // ── Markers carrying our own PID ─────────────────────────────────────────

    #[test]
    fn test_marker_with_our_pid_but_no_holder_here_is_reclaimed() {
        // Arrange – a previous process that had our PID died mid-save
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, std::process::id().to_string()).expect("write marker");
        let mut probe = MockProcessProbe::new();
        probe.expect_is_alive().never();
        let lock = FileLock::with_probe(&path, fast_settings(), Arc::new(probe));

        // Act
        let guard = lock.acquire_within(Duration::ZERO).expect("orphaned marker reclaimed");

        // Assert
        assert!(lock.held.load(Ordering::Acquire));
        drop(guard);
        assert!(!path.exists());
    }

    #[test]
    fn test_marker_with_our_pid_held_by_sibling_lock_is_respected() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        let holder = FileLock::new(&path, fast_settings());
        let contender = FileLock::new(dir.path().join(".").join(".config.lock"), fast_settings());
        let _guard = holder.acquire().expect("acquire");

        // Act
        let result = contender.acquire_within(Duration::ZERO);

        // Assert
        assert!(matches!(result, Err(LockError::Timeout { .. })));
        assert_eq!(
            fs::read_to_string(&path).expect("marker kept"),
            std::process::id().to_string()
        );
    }

    // ── Reclaiming ───────────────────────────────────────────────────────────

    #[test]
    fn test_reclaim_puts_back_marker_that_changed_after_inspection() {
        // Arrange – we judged "999999" stale, but "4242" has taken its place
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, "4242").expect("write marker");
        let lock = FileLock::with_probe(&path, fast_settings(), probe_answering(Some(false)));

        // Act
        let freed = lock.reclaim(Some("999999"));

        // Assert
        assert!(!freed);
        assert_eq!(fs::read_to_string(&path).expect("marker restored"), "4242");
        let entries = fs::read_dir(dir.path()).expect("read dir").count();
        assert_eq!(entries, 1, "no side files left behind");
    }

    #[test]
    fn test_reclaimed_marker_leaves_no_side_files() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".config.lock");
        fs::write(&path, "999999").expect("write marker");
        let lock = FileLock::with_probe(&path, fast_settings(), probe_answering(Some(false)));

        // Act
        let guard = lock.acquire_within(Duration::ZERO).expect("reclaimed");

        // Assert
        let names: Vec<String> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![".config.lock".to_string()]);
        drop(guard);
    }

    #[test]
    fn test_missing_directory_is_an_io_error_not_a_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lock = FileLock::new(dir.path().join("absent").join(".config.lock"), fast_settings());

        let result = lock.acquire();

        assert!(matches!(result, Err(LockError::Io { .. })));
    }

    #[test]
    fn test_default_settings_match_documented_values() {
        let settings = LockSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.stale_after, Duration::from_secs(30));
        assert_eq!(settings.initial_backoff, Duration::from_millis(100));
        assert_eq!(settings.max_backoff, Duration::from_millis(500));
    }
}
