//! Live settings read by the pipeline at decision time.
//!
//! The cache budget is a user setting that may change between runs (for
//! example via `wallshift set-cache-size`), so it is read when an eviction is
//! about to happen rather than captured once at startup.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use super::types::{default_cache_size_mb, Config};

/// Source of user-adjustable settings.
pub trait SettingsSource: Send + Sync {
    /// Current cache budget in megabytes.
    fn cache_budget_mb(&self) -> u64;
}

/// Re-reads the config file on every call.
///
/// Falls back to the value captured at construction when the file is missing
/// or unparseable.
pub struct FileSettings {
    path: Option<PathBuf>,
    fallback_mb: u64,
}

impl FileSettings {
    pub fn new(path: Option<PathBuf>, fallback_mb: u64) -> Self {
        Self { path, fallback_mb }
    }

    /// Settings bound to the file a config was loaded from.
    pub fn for_config(path: Option<PathBuf>, config: &Config) -> Self {
        Self::new(path, config.cache.max_size_mb)
    }
}

impl SettingsSource for FileSettings {
    fn cache_budget_mb(&self) -> u64 {
        let Some(path) = &self.path else {
            return self.fallback_mb;
        };

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| toml::from_str::<Config>(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(config) => config.cache.max_size_mb,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not re-read cache budget, using last known value");
                self.fallback_mb
            }
        }
    }
}

/// Fixed, programmatically adjustable settings.
pub struct StaticSettings {
    cache_budget_mb: AtomicU64,
}

impl StaticSettings {
    pub fn new(cache_budget_mb: u64) -> Self {
        Self {
            cache_budget_mb: AtomicU64::new(cache_budget_mb),
        }
    }

    pub fn set_cache_budget_mb(&self, mb: u64) {
        self.cache_budget_mb.store(mb, Ordering::Relaxed);
    }
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self::new(default_cache_size_mb())
    }
}

impl SettingsSource for StaticSettings {
    fn cache_budget_mb(&self) -> u64 {
        self.cache_budget_mb.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_settings_reads_at_call_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallshift.toml");
        std::fs::write(&path, "[cache]\nmax_size_mb = 50\n").unwrap();

        let settings = FileSettings::new(Some(path.clone()), 100);
        assert_eq!(settings.cache_budget_mb(), 50);

        std::fs::write(&path, "[cache]\nmax_size_mb = 75\n").unwrap();
        assert_eq!(settings.cache_budget_mb(), 75);
    }

    #[test]
    fn test_file_settings_falls_back() {
        let settings = FileSettings::new(Some(PathBuf::from("/nonexistent/w.toml")), 64);
        assert_eq!(settings.cache_budget_mb(), 64);

        let settings = FileSettings::new(None, 32);
        assert_eq!(settings.cache_budget_mb(), 32);
    }

    #[test]
    fn test_static_settings() {
        let settings = StaticSettings::default();
        assert_eq!(settings.cache_budget_mb(), 100);
        settings.set_cache_budget_mb(10);
        assert_eq!(settings.cache_budget_mb(), 10);
    }
}
