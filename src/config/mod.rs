//! Monitor Configuration Module
//!
//! Provides per-site configuration loaded from TOML files: design features,
//! alert thresholds, refresh cadence and data source.
//!
//! ## Loading Order
//!
//! 1. `DRAINAGE_CONFIG` environment variable (path to TOML file)
//! 2. `drainage_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The loaded config lives behind a [`ConfigHandle`]. Readers take a snapshot
//! with `handle.load()`; operator updates and file reloads swap in a whole new
//! config, so a refresh tick never sees a half-applied change.
//!
//! ```ignore
//! let handle = ConfigHandle::new(MonitorConfig::load());
//! let params = handle.load().design_parameters();
//! ```

mod monitor_config;
pub mod defaults;
pub mod validation;
pub mod watcher;

pub use monitor_config::*;
pub use validation::ValidationWarning;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

/// The file [`MonitorConfig::load`] would read, if any exists.
pub fn locate_config_file() -> Option<PathBuf> {
    std::env::var(defaults::CONFIG_ENV_VAR)
        .ok()
        .map(PathBuf::from)
        .into_iter()
        .chain(std::iter::once(PathBuf::from(defaults::LOCAL_CONFIG_FILE)))
        .find(|p| p.exists())
}

/// Shared, atomically swappable configuration.
///
/// Every write is a compare-and-swap against the snapshot it was derived
/// from, so concurrent operator updates and file reloads never drop each
/// other's changes.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<MonitorConfig>>,
    overrides: Arc<ConfigOverrides>,
}

impl ConfigHandle {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_overrides(config, ConfigOverrides::default())
    }

    /// Handle whose file reloads keep `overrides` applied.
    pub fn with_overrides(mut config: MonitorConfig, overrides: ConfigOverrides) -> Self {
        overrides.apply(&mut config);
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
            overrides: Arc::new(overrides),
        }
    }

    /// Consistent snapshot of the current config.
    pub fn load(&self) -> Arc<MonitorConfig> {
        self.inner.load_full()
    }

    pub fn overrides(&self) -> &ConfigOverrides {
        &self.overrides
    }

    /// Apply an operator update atomically.
    ///
    /// The update is recomputed against the latest snapshot until the swap
    /// lands; the returned warnings belong to that final attempt. On error
    /// the current config is unchanged.
    pub fn update(
        &self,
        update: &ConfigUpdate,
    ) -> Result<(Arc<MonitorConfig>, Vec<ValidationWarning>), ConfigError> {
        let mut current = self.inner.load_full();
        loop {
            let (next, warnings) = current.apply_update(update)?;
            let next = Arc::new(next);
            let previous = self.inner.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &current) {
                tracing::info!(warnings = warnings.len(), "Runtime config updated");
                return Ok((next, warnings));
            }
            current = Guard::into_inner(previous);
        }
    }

    /// Re-read `path`, re-apply process overrides and swap it in.
    ///
    /// The previous config stays active on error.
    pub fn reload_from(&self, path: &Path) -> Result<Arc<MonitorConfig>, ConfigError> {
        let mut next = MonitorConfig::load_from_file(path)?;
        if !self.overrides.is_empty() {
            self.overrides.apply(&mut next);
            next.validate()?;
        }
        let next = Arc::new(next);
        self.inner.store(Arc::clone(&next));
        Ok(next)
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_update_swaps_snapshot() {
        let handle = ConfigHandle::default();
        let before = handle.load();

        let update = ConfigUpdate {
            storage_capacity_m3: Some(2500.0),
            ..ConfigUpdate::default()
        };
        let (after, warnings) = handle.update(&update).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(after.design.storage_capacity_m3, 2500.0);
        assert_eq!(handle.load().design.storage_capacity_m3, 2500.0);

        // Snapshots taken earlier are unaffected
        assert_eq!(before.design.storage_capacity_m3, 1200.0);
    }

    #[test]
    fn test_failed_update_keeps_config() {
        let handle = ConfigHandle::default();
        let update = ConfigUpdate {
            clog_level_pct: Some(f64::NAN),
            ..ConfigUpdate::default()
        };
        assert!(handle.update(&update).is_err());
        assert_eq!(*handle.load(), MonitorConfig::default());
    }

    #[test]
    fn test_reload_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[alerts]\ntank_critical_pct = 75.0").unwrap();
        file.flush().unwrap();

        let handle = ConfigHandle::default();
        handle.reload_from(file.path()).unwrap();
        assert_eq!(handle.load().alerts.tank_critical_pct, 75.0);
    }

    #[test]
    fn test_reload_keeps_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\naddr = \"0.0.0.0:7000\"\n\n[ingest]\nseed = 3\n\n[alerts]\ntank_critical_pct = 80.0"
        )
        .unwrap();
        file.flush().unwrap();

        let overrides = ConfigOverrides {
            addr: Some("127.0.0.1:9100".to_string()),
            csv_path: Some(PathBuf::from("data/feed.csv")),
            ..ConfigOverrides::default()
        };
        let handle = ConfigHandle::with_overrides(MonitorConfig::default(), overrides);
        assert_eq!(handle.load().server.addr, "127.0.0.1:9100");

        let reloaded = handle.reload_from(file.path()).unwrap();
        assert_eq!(reloaded.alerts.tank_critical_pct, 80.0);
        assert_eq!(reloaded.server.addr, "127.0.0.1:9100");
        assert_eq!(reloaded.ingest.csv_path, Some(PathBuf::from("data/feed.csv")));
        assert_eq!(reloaded.ingest.seed, Some(3));
    }

    #[test]
    fn test_sequential_updates_accumulate() {
        let handle = ConfigHandle::default();
        let first = ConfigUpdate {
            clog_level_pct: Some(40.0),
            ..ConfigUpdate::default()
        };
        handle.update(&first).unwrap();

        let second = ConfigUpdate {
            storage_capacity_m3: Some(900.0),
            ..ConfigUpdate::default()
        };
        let (after, _) = handle.update(&second).unwrap();
        assert_eq!(after.design.clog_level_pct, 40.0);
        assert_eq!(after.design.storage_capacity_m3, 900.0);
    }

    #[test]
    fn test_reload_parse_error_keeps_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[alerts\ntank_critical_pct = ").unwrap();
        file.flush().unwrap();

        let handle = ConfigHandle::default();
        assert!(matches!(
            handle.reload_from(file.path()),
            Err(ConfigError::Parse(..))
        ));
        assert_eq!(*handle.load(), MonitorConfig::default());
    }
}
