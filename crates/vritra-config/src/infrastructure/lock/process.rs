//! Process liveness checks used to detect abandoned lock markers.
//!
//! A lock marker records the PID of the process that created it.  If that
//! process has exited without removing the marker (crash, `kill -9`, power
//! loss), the marker is stale and may be reclaimed.
//!
//! Not every platform offers a cheap, dependency-free liveness check, so the
//! answer is tri-state: alive, dead, or unknown.  When the answer is unknown
//! the lock manager falls back to the marker's age.

use std::path::Path;

/// Trait abstracting "is this process still running?".
///
/// The production implementation is [`SystemProcessProbe`]; tests substitute a
/// mock so staleness can be exercised without spawning and killing processes.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessProbe: Send + Sync {
    /// Returns `Some(true)` if `pid` is running, `Some(false)` if it is
    /// provably gone, and `None` if this platform cannot tell.
    fn is_alive(&self, pid: u32) -> Option<bool>;
}

/// Liveness check backed by the operating system.
///
/// - Linux: looks for `/proc/<pid>`.  If `/proc` itself is not mounted (some
///   minimal containers) the answer is unknown rather than "dead".
/// - Other platforms: always unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessProbe;

impl ProcessProbe for SystemProcessProbe {
    fn is_alive(&self, pid: u32) -> Option<bool> {
        if pid == std::process::id() {
            return Some(true);
        }
        proc_fs_lookup(Path::new("/proc"), pid)
    }
}

#[cfg(target_os = "linux")]
fn proc_fs_lookup(proc_root: &Path, pid: u32) -> Option<bool> {
    if !proc_root.join("self").exists() {
        return None;
    }
    Some(proc_root.join(pid.to_string()).exists())
}

#[cfg(not(target_os = "linux"))]
fn proc_fs_lookup(_proc_root: &Path, _pid: u32) -> Option<bool> {
    None
}
