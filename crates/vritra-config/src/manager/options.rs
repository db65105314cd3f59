//! Construction-time settings for [`super::ConfigManager`].

use std::path::PathBuf;
use std::time::Duration;

use crate::infrastructure::lock::LockSettings;
use crate::infrastructure::storage::default_config_dir;

/// Everything a [`super::ConfigManager`] needs to know up front.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use vritra_config::ManagerOptions;
///
/// let options = ManagerOptions::in_dir("/tmp/vritra-example")
///     .with_app_version("0.30.5")
///     .with_cache_ttl(Duration::from_secs(2));
/// assert_eq!(options.app_version.as_deref(), Some("0.30.5"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerOptions {
    /// Directory holding `config.json`, its backup, and the lock marker.
    pub config_dir: PathBuf,
    /// Stamped into `_config_version` on every save.  `None` leaves the
    /// field as it is.
    pub app_version: Option<String>,
    /// How long a loaded document may be served without touching disk.
    pub cache_ttl: Duration,
    /// Cross-process lock timing.
    pub lock: LockSettings,
}

impl Default for ManagerOptions {
    /// Uses [`default_config_dir`], no version stamp, a 5 second cache, and
    /// [`LockSettings::default`].
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            app_version: None,
            cache_ttl: Duration::from_secs(5),
            lock: LockSettings::default(),
        }
    }
}

impl ManagerOptions {
    /// Default options pointed at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: dir.into(),
            app_version: None,
            cache_ttl: Duration::from_secs(5),
            lock: LockSettings::default(),
        }
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_lock_settings(mut self, lock: LockSettings) -> Self {
        self.lock = lock;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_uses_documented_defaults() {
        let options = ManagerOptions::in_dir("/tmp/x");

        assert_eq!(options.config_dir, PathBuf::from("/tmp/x"));
        assert_eq!(options.app_version, None);
        assert_eq!(options.cache_ttl, Duration::from_secs(5));
        assert_eq!(options.lock, LockSettings::default());
    }

    #[test]
    fn test_builder_methods_override_fields() {
        let lock = LockSettings {
            timeout: Duration::from_millis(50),
            ..LockSettings::default()
        };

        let options = ManagerOptions::in_dir("/tmp/x")
            .with_app_version("1.2.3")
            .with_cache_ttl(Duration::ZERO)
            .with_lock_settings(lock.clone());

        assert_eq!(options.app_version.as_deref(), Some("1.2.3"));
        assert_eq!(options.cache_ttl, Duration::ZERO);
        assert_eq!(options.lock, lock);
    }
}
