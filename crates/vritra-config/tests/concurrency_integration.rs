//! Integration tests for concurrent access and lock reclamation.
//!
//! # Purpose
//!
//! Several shell instances share one settings directory.  These tests stand
//! in for those instances with independent `ConfigManager`s on separate
//! threads (each manager has its own in-process mutex, so only the file lock
//! keeps them apart).  They verify:
//!
//! - Writers with distinct keys never lose each other's changes.
//! - A concurrent reader never observes a partially written file.
//! - A lock marker left behind by a dead process is reclaimed promptly,
//!   including one that carries our own PID.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use vritra_config::{
    keys, ConfigDocument, ConfigError, ConfigManager, ConfigValue, FileLock, LockSettings,
    ManagerOptions, ProcessProbe,
};

fn contended_options(dir: &Path) -> ManagerOptions {
    ManagerOptions::in_dir(dir).with_lock_settings(LockSettings {
        timeout: Duration::from_secs(20),
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(20),
        ..LockSettings::default()
    })
}

/// Reports one specific PID as exited and every other PID as running.
struct DeadPid(u32);

impl ProcessProbe for DeadPid {
    fn is_alive(&self, pid: u32) -> Option<bool> {
        Some(pid != self.0)
    }
}

/// Cannot tell whether any process is running.
struct UnknownLiveness;

impl ProcessProbe for UnknownLiveness {
    fn is_alive(&self, _pid: u32) -> Option<bool> {
        None
    }
}

// ── Concurrent writers ────────────────────────────────────────────────────────

#[test]
fn test_concurrent_writers_with_distinct_keys_all_land() {
    const WRITERS: usize = 6;
    const WRITES_PER_WRITER: usize = 5;

    // Arrange
    let dir = tempfile::tempdir().expect("tempdir");
    ConfigManager::new(contended_options(dir.path())).load_config(false);
    let config_file = dir.path().join("config.json");
    let done = Arc::new(AtomicBool::new(false));

    // A reader that parses the canonical file as fast as it can.
    let reader = {
        let done = Arc::clone(&done);
        let config_file = config_file.clone();
        thread::spawn(move || {
            let mut reads = 0usize;
            while !done.load(Ordering::Acquire) {
                let bytes = fs::read(&config_file).expect("canonical file always present");
                if let Err(e) = ConfigDocument::from_slice(&bytes) {
                    panic!("observed a partial document: {e}");
                }
                reads += 1;
            }
            reads
        })
    };

    // Act
    let writers: Vec<_> = (0..WRITERS)
        .map(|i| {
            let dir = dir.path().to_path_buf();
            thread::spawn(move || {
                let manager = ConfigManager::new(contended_options(&dir));
                for round in 0..WRITES_PER_WRITER {
                    let value = i64::try_from(round).expect("small");
                    manager
                        .set_value(format!("writer_{i}"), value)
                        .expect("write under contention");
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread");
    }
    done.store(true, Ordering::Release);
    let reads = reader.join().expect("reader thread");

    // Assert
    let text = fs::read_to_string(&config_file).expect("read");
    let doc = ConfigDocument::parse(&text).expect("final document valid");
    let last = i64::try_from(WRITES_PER_WRITER - 1).expect("small");
    for i in 0..WRITERS {
        assert_eq!(
            doc.get(&format!("writer_{i}")),
            Some(&ConfigValue::Integer(last)),
            "writer_{i} lost"
        );
    }
    let expected_saves = u64::try_from(1 + WRITERS * WRITES_PER_WRITER).expect("small");
    assert_eq!(doc.update_count(), expected_saves, "every save counted once");
    assert!(reads > 0);
    assert!(!dir.path().join(".config.lock").exists());
}

#[test]
fn test_threads_sharing_one_manager_serialize_cleanly() {
    // Arrange
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = Arc::new(ConfigManager::new(contended_options(dir.path())));

    // Act
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                manager
                    .set_value(format!("thread_{i}"), true)
                    .expect("write")
            })
        })
        .collect();
    let results: Vec<bool> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();

    // Assert
    assert!(results.iter().all(|wrote| *wrote));
    let doc = manager.load_config(false);
    for i in 0..4 {
        assert_eq!(doc.get(&format!("thread_{i}")), Some(&ConfigValue::Bool(true)));
    }
}

// ── Stale lock reclamation ────────────────────────────────────────────────────

#[test]
fn test_dead_holder_is_reclaimed_before_the_first_backoff_sleep() {
    // Arrange
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_file = dir.path().join(".config.lock");
    fs::write(&lock_file, "777777").expect("abandoned marker");
    let settings = LockSettings::default();
    let initial_backoff = settings.initial_backoff;
    let lock = FileLock::with_probe(&lock_file, settings, Arc::new(DeadPid(777_777)));

    // Act
    let started = Instant::now();
    let guard = lock.acquire().expect("reclaimed");
    let elapsed = started.elapsed();

    // Assert
    assert!(elapsed < initial_backoff, "took {elapsed:?}");
    drop(guard);
    assert!(!lock_file.exists());
}

#[test]
fn test_set_value_reclaims_marker_of_dead_process() {
    // Arrange
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_file = dir.path().join(".config.lock");
    let manager = ConfigManager::with_probe(
        ManagerOptions::in_dir(dir.path()),
        Arc::new(DeadPid(777_777)),
    );
    manager.load_config(false);
    fs::write(&lock_file, "777777").expect("abandoned marker");

    // Act
    let wrote = manager.set_value(keys::THEME, "volcano").expect("write");

    // Assert
    assert!(wrote);
    assert!(!lock_file.exists());
    assert_eq!(manager.get_value(keys::THEME, ""), ConfigValue::from("volcano"));
}

#[test]
fn test_set_value_reclaims_marker_left_by_earlier_process_with_our_pid() {
    // Arrange – after a reboot or in a container, our PID may match a crashed
    // earlier instance's
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_file = dir.path().join(".config.lock");
    let manager = ConfigManager::new(ManagerOptions::in_dir(dir.path()));
    manager.load_config(false);
    fs::write(&lock_file, std::process::id().to_string()).expect("orphaned marker");

    // Act
    let wrote = manager.set_value(keys::THEME, "volcano").expect("write");

    // Assert
    assert!(wrote);
    assert!(!lock_file.exists());
    assert_eq!(manager.get_value(keys::THEME, ""), ConfigValue::from("volcano"));
}

#[test]
fn test_managers_in_one_process_still_exclude_each_other() {
    // Arrange – one manager holds the lock for the length of an update
    let dir = tempfile::tempdir().expect("tempdir");
    let holder = ConfigManager::new(ManagerOptions::in_dir(dir.path()));
    let contender = ConfigManager::new(ManagerOptions::in_dir(dir.path()).with_lock_settings(
        LockSettings {
            timeout: Duration::from_millis(100),
            ..LockSettings::default()
        },
    ));
    holder.load_config(false);

    // Act
    let mut contended = None;
    holder
        .update_with(|doc| {
            contended = Some(contender.set_value(keys::OFFLINE_MODE, true));
            doc.insert(keys::THEME, "matrix");
        })
        .expect("holder update");

    // Assert
    assert!(matches!(contended, Some(Err(ConfigError::LockTimeout { .. }))));
    assert_eq!(contender.get_value(keys::THEME, ""), ConfigValue::from("matrix"));
}

#[test]
fn test_old_marker_is_reclaimed_when_liveness_is_unknown() {
    // Arrange
    let dir = tempfile::tempdir().expect("tempdir");
    let lock_file = dir.path().join(".config.lock");
    let settings = LockSettings {
        timeout: Duration::from_millis(100),
        ..LockSettings::default()
    };
    fs::write(&lock_file, "31337").expect("marker");
    let marker = fs::File::options().write(true).open(&lock_file).expect("open");
    marker
        .set_modified(SystemTime::now() - Duration::from_secs(120))
        .expect("backdate");
    drop(marker);
    let lock = FileLock::with_probe(&lock_file, settings, Arc::new(UnknownLiveness));

    // Act
    let guard = lock.acquire().expect("old marker reclaimed");

    // Assert
    assert_eq!(
        fs::read_to_string(&lock_file).expect("marker"),
        std::process::id().to_string()
    );
    guard.release().expect("release");
    assert!(!lock_file.exists());
}

#[test]
fn test_live_foreign_marker_makes_save_fail_without_touching_file() {
    // Arrange
    let dir = tempfile::tempdir().expect("tempdir");
    let options = ManagerOptions::in_dir(dir.path()).with_lock_settings(LockSettings {
        timeout: Duration::from_millis(150),
        ..LockSettings::default()
    });
    let manager = ConfigManager::with_probe(options, Arc::new(DeadPid(0)));
    let doc = manager.load_config(false);
    let before = fs::read(dir.path().join("config.json")).expect("read");
    fs::write(dir.path().join(".config.lock"), "123456").expect("foreign marker");

    // Act
    let result = manager.save_config(&doc);

    // Assert
    assert!(matches!(result, Err(ConfigError::LockTimeout { .. })));
    assert_eq!(fs::read(dir.path().join("config.json")).expect("read"), before);
}
