//! Monitor Configuration - design parameters and alert thresholds as TOML values
//!
//! Every operator control of the dashboard is a field in this module.
//! Each struct implements `Default` with the values the dashboard ships with,
//! so the service runs unchanged when no config file is present.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults::{CONFIG_ENV_VAR, DEFAULT_SERVER_ADDR, LOCAL_CONFIG_FILE, MAX_WINDOW_STEPS};
use super::validation::{self, ValidationWarning};
use crate::acquisition::SyntheticConfig;
use crate::types::DesignParameters;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitored site.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$DRAINAGE_CONFIG` env var
/// 2. `./drainage_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Site identification
    #[serde(default)]
    pub site: SiteInfo,

    /// Refresh loop and history window
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Infrastructure design features
    #[serde(default)]
    pub design: DesignConfig,

    /// Alert thresholds
    #[serde(default)]
    pub alerts: AlertThresholdConfig,

    /// Data source selection
    #[serde(default)]
    pub ingest: IngestConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$DRAINAGE_CONFIG` environment variable
    /// 2. `./drainage_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), site = %config.site.name, "Loaded config from DRAINAGE_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from DRAINAGE_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "DRAINAGE_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./drainage_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(site = %config.site.name, "Loaded config from ./drainage_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./drainage_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No drainage_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys and out-of-domain values are logged as warnings; values
    /// outside their domain are clamped to the nearest boundary.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse, validate and clamp a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in &validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let mut config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        for w in &config.clamp_to_domain() {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save the current config to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Reject values no clamp can repair.
    ///
    /// - All real-valued fields must be finite
    /// - `ingest.step_minutes` must be > 0
    /// - `server.addr` must parse as a socket address
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        for (key, value) in self.real_fields() {
            if !value.is_finite() {
                errors.push(format!("{key}: value must be finite (got {value})"));
            }
        }

        if self.ingest.step_minutes == 0 {
            errors.push("ingest.step_minutes must be > 0".to_string());
        }

        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr '{}' is not a valid HOST:PORT socket address",
                self.server.addr
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Clamp every bounded field into its documented domain.
    ///
    /// Returns one warning per adjusted field. Idempotent.
    pub fn clamp_to_domain(&mut self) -> Vec<ValidationWarning> {
        validation::clamp_to_domain(self)
    }

    /// All real-valued fields with their dotted key, for finiteness checks.
    pub(crate) fn real_fields(&self) -> [(&'static str, f64); 8] {
        let d = &self.design;
        let a = &self.alerts;
        [
            ("design.infiltration_capacity_mm_hr", d.infiltration_capacity_mm_hr),
            ("design.vertical_drainage_capacity_lps", d.vertical_drainage_capacity_lps),
            ("design.storage_capacity_m3", d.storage_capacity_m3),
            ("design.clog_level_pct", d.clog_level_pct),
            ("design.catchment_area_m2", d.catchment_area_m2),
            ("alerts.tank_critical_pct", a.tank_critical_pct),
            ("alerts.rain_spike_delta_mm_hr", a.rain_spike_delta_mm_hr),
            ("alerts.flow_block_threshold_lps", a.flow_block_threshold_lps),
        ]
    }

    /// Model parameters for one tick.
    pub fn design_parameters(&self) -> DesignParameters {
        DesignParameters {
            infiltration_capacity: self.design.infiltration_capacity_mm_hr,
            vertical_drainage_capacity: self.design.vertical_drainage_capacity_lps,
            storage_capacity: self.design.storage_capacity_m3,
            clog_fraction: DesignParameters::clog_fraction_from_pct(self.design.clog_level_pct),
            catchment_area: self.design.catchment_area_m2,
            tank_critical_pct: self.alerts.tank_critical_pct,
            rain_spike_threshold: self.alerts.rain_spike_delta_mm_hr,
            flow_block_threshold: self.alerts.flow_block_threshold_lps,
            zone_high_risk_threshold: self.alerts.zone_high_risk_score,
        }
    }

    /// Rolling window size in readings.
    ///
    /// Converts `history_window_hours` into steps of `ingest.step_minutes`,
    /// rounding up so the window covers at least the configured hours, then
    /// caps at `MAX_WINDOW_STEPS` readings.
    pub fn window_size(&self) -> usize {
        let step_minutes = usize::try_from(self.ingest.step_minutes.max(1)).unwrap_or(usize::MAX);
        let minutes = self.dashboard.history_window_hours.saturating_mul(60);
        minutes.div_ceil(step_minutes).clamp(1, MAX_WINDOW_STEPS)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard.refresh_interval_secs)
    }

    pub fn synthetic_config(&self) -> SyntheticConfig {
        SyntheticConfig {
            step: chrono::Duration::minutes(i64::from(self.ingest.step_minutes)),
            demo_spike: self.ingest.demo_spike,
            seed: self.ingest.seed,
        }
    }

    /// Apply an operator update, returning the clamped result and warnings.
    ///
    /// `self` is left untouched; callers swap the returned config in.
    pub fn apply_update(
        &self,
        update: &ConfigUpdate,
    ) -> Result<(Self, Vec<ValidationWarning>), ConfigError> {
        let mut next = self.clone();

        macro_rules! set {
            ($($field:ident => $target:expr),* $(,)?) => {
                $(if let Some(v) = update.$field { $target = v; })*
            };
        }
        set!(
            refresh_interval_secs => next.dashboard.refresh_interval_secs,
            history_window_hours => next.dashboard.history_window_hours,
            infiltration_capacity_mm_hr => next.design.infiltration_capacity_mm_hr,
            vertical_drainage_capacity_lps => next.design.vertical_drainage_capacity_lps,
            storage_capacity_m3 => next.design.storage_capacity_m3,
            clog_level_pct => next.design.clog_level_pct,
            catchment_area_m2 => next.design.catchment_area_m2,
            tank_critical_pct => next.alerts.tank_critical_pct,
            rain_spike_delta_mm_hr => next.alerts.rain_spike_delta_mm_hr,
            flow_block_threshold_lps => next.alerts.flow_block_threshold_lps,
            zone_high_risk_score => next.alerts.zone_high_risk_score,
        );

        next.validate()?;
        let warnings = next.clamp_to_domain();
        Ok((next, warnings))
    }
}

// ============================================================================
// Runtime Update
// ============================================================================

/// Partial update of the operator controls (dashboard sliders).
///
/// Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigUpdate {
    pub refresh_interval_secs: Option<u64>,
    pub history_window_hours: Option<usize>,
    pub infiltration_capacity_mm_hr: Option<f64>,
    pub vertical_drainage_capacity_lps: Option<f64>,
    pub storage_capacity_m3: Option<f64>,
    pub clog_level_pct: Option<f64>,
    pub catchment_area_m2: Option<f64>,
    pub tank_critical_pct: Option<f64>,
    pub rain_spike_delta_mm_hr: Option<f64>,
    pub flow_block_threshold_lps: Option<f64>,
    pub zone_high_risk_score: Option<u8>,
}

// ============================================================================
// Process Overrides
// ============================================================================

/// Values pinned by the command line for the life of the process.
///
/// Re-applied on top of every file reload, so a reloaded config never
/// reports a bind address or dataset the process is not actually using.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub addr: Option<String>,
    pub csv_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub disable_demo_spike: bool,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, config: &mut MonitorConfig) {
        if let Some(ref addr) = self.addr {
            config.server.addr.clone_from(addr);
        }
        if let Some(ref csv) = self.csv_path {
            config.ingest.csv_path = Some(csv.clone());
        }
        if let Some(seed) = self.seed {
            config.ingest.seed = Some(seed);
        }
        if self.disable_demo_spike {
            config.ingest.demo_spike = false;
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Site Info
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Display name of the monitored catchment
    #[serde(default = "default_site_name")]
    pub name: String,
}

fn default_site_name() -> String { "Demo Catchment".to_string() }

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: default_site_name(),
        }
    }
}

// ============================================================================
// Dashboard Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Seconds between refresh ticks (2-30).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Rolling history window in hours (6-72); converted into readings with
    /// `ingest.step_minutes`, at most 72 readings.
    #[serde(default = "default_history_window")]
    pub history_window_hours: usize,
}

fn default_refresh_interval() -> u64 { 8 }
fn default_history_window() -> usize { 24 }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            history_window_hours: default_history_window(),
        }
    }
}

// ============================================================================
// Design Features
// ============================================================================

/// Drainage infrastructure design features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignConfig {
    /// Permeable paving infiltration capacity (mm/hr, 0-50).
    #[serde(default = "default_infiltration")]
    pub infiltration_capacity_mm_hr: f64,

    /// Vertical drainage capacity (L/s, 5-120).
    #[serde(default = "default_vertical")]
    pub vertical_drainage_capacity_lps: f64,

    /// Underground storage capacity (m³, 50-5000).
    #[serde(default = "default_storage")]
    pub storage_capacity_m3: f64,

    /// Clogging / blockage level (%, 0-100).
    #[serde(default = "default_clog")]
    pub clog_level_pct: f64,

    /// Catchment area served (m², 500-200000).
    #[serde(default = "default_area")]
    pub catchment_area_m2: f64,
}

fn default_infiltration() -> f64 { 18.0 }
fn default_vertical() -> f64 { 45.0 }
fn default_storage() -> f64 { 1200.0 }
fn default_clog() -> f64 { 18.0 }
fn default_area() -> f64 { 25_000.0 }

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            infiltration_capacity_mm_hr: default_infiltration(),
            vertical_drainage_capacity_lps: default_vertical(),
            storage_capacity_m3: default_storage(),
            clog_level_pct: default_clog(),
            catchment_area_m2: default_area(),
        }
    }
}

// ============================================================================
// Alert Thresholds
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholdConfig {
    /// Tank fill that raises a tank-high alert (%, 70-95).
    #[serde(default = "default_tank_critical")]
    pub tank_critical_pct: f64,

    /// Rain increase between readings that counts as a spike (mm/hr, 2-20).
    #[serde(default = "default_rain_spike")]
    pub rain_spike_delta_mm_hr: f64,

    /// Drain flow at or below this is a restriction (L/s, 0-50).
    #[serde(default = "default_flow_block")]
    pub flow_block_threshold_lps: f64,

    /// Zone score flagged HIGH (0-100).
    #[serde(default = "default_zone_high_risk")]
    pub zone_high_risk_score: u8,
}

fn default_tank_critical() -> f64 { 85.0 }
fn default_rain_spike() -> f64 { 6.0 }
fn default_flow_block() -> f64 { 8.0 }
fn default_zone_high_risk() -> u8 { 70 }

impl Default for AlertThresholdConfig {
    fn default() -> Self {
        Self {
            tank_critical_pct: default_tank_critical(),
            rain_spike_delta_mm_hr: default_rain_spike(),
            flow_block_threshold_lps: default_flow_block(),
            zone_high_risk_score: default_zone_high_risk(),
        }
    }
}

// ============================================================================
// Ingest Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// CSV dataset to replay instead of synthetic data.
    #[serde(default)]
    pub csv_path: Option<PathBuf>,

    /// Minutes between synthetic readings.
    #[serde(default = "default_step_minutes")]
    pub step_minutes: u32,

    /// Inject one demo rain spike into synthetic windows.
    #[serde(default = "default_demo_spike")]
    pub demo_spike: bool,

    /// Seed for reproducible synthetic data.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_step_minutes() -> u32 { 60 }
fn default_demo_spike() -> bool { true }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            step_minutes: default_step_minutes(),
            demo_spike: default_demo_spike(),
            seed: None,
        }
    }
}

// ============================================================================
// Server Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String { DEFAULT_SERVER_ADDR.to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashboard_controls() {
        let config = MonitorConfig::default();
        assert_eq!(config.dashboard.refresh_interval_secs, 8);
        assert_eq!(config.dashboard.history_window_hours, 24);
        assert_eq!(config.design.infiltration_capacity_mm_hr, 18.0);
        assert_eq!(config.design.vertical_drainage_capacity_lps, 45.0);
        assert_eq!(config.design.storage_capacity_m3, 1200.0);
        assert_eq!(config.design.clog_level_pct, 18.0);
        assert_eq!(config.design.catchment_area_m2, 25_000.0);
        assert_eq!(config.alerts.tank_critical_pct, 85.0);
        assert_eq!(config.alerts.rain_spike_delta_mm_hr, 6.0);
        assert_eq!(config.alerts.flow_block_threshold_lps, 8.0);
        assert_eq!(config.alerts.zone_high_risk_score, 70);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_design_parameters() {
        assert_eq!(
            MonitorConfig::default().design_parameters(),
            DesignParameters::default()
        );
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = MonitorConfig::from_toml_str(
            r#"
[design]
clog_level_pct = 40.0
"#,
        )
        .unwrap();
        assert_eq!(config.design.clog_level_pct, 40.0);
        assert_eq!(config.design.storage_capacity_m3, 1200.0);
        assert!((config.design_parameters().clog_fraction - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_domain_values_are_clamped() {
        let config = MonitorConfig::from_toml_str(
            r#"
[dashboard]
refresh_interval_secs = 1
history_window_hours = 500

[design]
clog_level_pct = 140.0
catchment_area_m2 = 10.0
"#,
        )
        .unwrap();
        assert_eq!(config.dashboard.refresh_interval_secs, 2);
        assert_eq!(config.dashboard.history_window_hours, 72);
        assert_eq!(config.design.clog_level_pct, 100.0);
        assert_eq!(config.design.catchment_area_m2, 500.0);
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let mut config = MonitorConfig::default();
        config.design.storage_capacity_m3 = f64::NAN;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("design.storage_capacity_m3")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_server_addr_is_rejected() {
        let mut config = MonitorConfig::default();
        config.server.addr = "not-an-address".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_step_is_rejected() {
        let mut config = MonitorConfig::default();
        config.ingest.step_minutes = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_apply_update_clamps_and_leaves_original() {
        let original = MonitorConfig::default();
        let update = ConfigUpdate {
            clog_level_pct: Some(55.0),
            tank_critical_pct: Some(99.0),
            ..ConfigUpdate::default()
        };
        let (next, warnings) = original.apply_update(&update).unwrap();
        assert_eq!(next.design.clog_level_pct, 55.0);
        assert_eq!(next.alerts.tank_critical_pct, 95.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "alerts.tank_critical_pct");
        assert_eq!(original.design.clog_level_pct, 18.0);
    }

    #[test]
    fn test_apply_update_rejects_non_finite() {
        let update = ConfigUpdate {
            rain_spike_delta_mm_hr: Some(f64::INFINITY),
            ..ConfigUpdate::default()
        };
        assert!(MonitorConfig::default().apply_update(&update).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = MonitorConfig::default();
        config.site.name = "Station Plaza".to_string();
        config.ingest.csv_path = Some(PathBuf::from("data/feed.csv"));
        let text = config.to_toml().unwrap();
        let back = MonitorConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_overrides_pin_cli_values() {
        let overrides = ConfigOverrides {
            addr: Some("127.0.0.1:9000".to_string()),
            csv_path: Some(PathBuf::from("feed.csv")),
            seed: None,
            disable_demo_spike: true,
        };
        assert!(!overrides.is_empty());
        assert!(ConfigOverrides::default().is_empty());

        let mut config = MonitorConfig::default();
        config.ingest.seed = Some(4);
        overrides.apply(&mut config);
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.ingest.csv_path, Some(PathBuf::from("feed.csv")));
        assert_eq!(config.ingest.seed, Some(4));
        assert!(!config.ingest.demo_spike);
    }

    #[test]
    fn test_window_size_follows_step_minutes() {
        let mut config = MonitorConfig::default();
        assert_eq!(config.window_size(), 24);

        config.ingest.step_minutes = 15;
        config.dashboard.history_window_hours = 12;
        assert_eq!(config.window_size(), 48);

        // 24 h at 15 min would be 96 readings
        config.dashboard.history_window_hours = 24;
        assert_eq!(config.window_size(), MAX_WINDOW_STEPS);

        config.ingest.step_minutes = 120;
        assert_eq!(config.window_size(), 12);

        // Partial steps round up
        config.ingest.step_minutes = 45;
        config.dashboard.history_window_hours = 7;
        assert_eq!(config.window_size(), 10);
    }

    #[test]
    fn test_synthetic_config_from_ingest() {
        let mut config = MonitorConfig::default();
        config.ingest.step_minutes = 15;
        config.ingest.demo_spike = false;
        config.ingest.seed = Some(9);
        let synthetic = config.synthetic_config();
        assert_eq!(synthetic.step, chrono::Duration::minutes(15));
        assert!(!synthetic.demo_spike);
        assert_eq!(synthetic.seed, Some(9));
    }
}
