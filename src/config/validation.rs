//! Config validation: unknown-key detection with Levenshtein suggestions
//! and domain clamping.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;
use std::fmt::Display;

use serde::Serialize;

use super::defaults::{MAX_REFRESH_SECS, MAX_WINDOW_STEPS, MIN_REFRESH_SECS, MIN_WINDOW_STEPS};
use super::MonitorConfig;

/// A non-fatal config warning (typo, clamped value).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for MonitorConfig.
///
/// Maintained by hand to match the struct hierarchy in monitor_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [site]
        "site",
        "site.name",
        // [dashboard]
        "dashboard",
        "dashboard.refresh_interval_secs",
        "dashboard.history_window_hours",
        // [design]
        "design",
        "design.infiltration_capacity_mm_hr",
        "design.vertical_drainage_capacity_lps",
        "design.storage_capacity_m3",
        "design.clog_level_pct",
        "design.catchment_area_m2",
        // [alerts]
        "alerts",
        "alerts.tank_critical_pct",
        "alerts.rain_spike_delta_mm_hr",
        "alerts.flow_block_threshold_lps",
        "alerts.zone_high_risk_score",
        // [ingest]
        "ingest",
        "ingest.csv_path",
        "ingest.step_minutes",
        "ingest.demo_spike",
        "ingest.seed",
        // [server]
        "server",
        "server.addr",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so output is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails on unknown keys. Parse errors are left to serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Domain Clamping
// ============================================================================

fn clamp_field<T>(value: &mut T, field: &str, lo: T, hi: T, warnings: &mut Vec<ValidationWarning>)
where
    T: PartialOrd + Copy + Display,
{
    let clamped = if *value < lo {
        lo
    } else if *value > hi {
        hi
    } else {
        return;
    };
    warnings.push(ValidationWarning {
        field: field.to_string(),
        message: format!("{field} = {value} is outside {lo}-{hi}, clamped to {clamped}"),
        suggestion: None,
    });
    *value = clamped;
}

/// Clamp every bounded field of `config` into its domain.
///
/// Non-finite values must be rejected by `MonitorConfig::validate` first;
/// NaN compares false against both bounds and is left unchanged here.
pub fn clamp_to_domain(config: &mut MonitorConfig) -> Vec<ValidationWarning> {
    let mut w = Vec::new();

    let dash = &mut config.dashboard;
    clamp_field(
        &mut dash.refresh_interval_secs,
        "dashboard.refresh_interval_secs",
        MIN_REFRESH_SECS,
        MAX_REFRESH_SECS,
        &mut w,
    );
    clamp_field(
        &mut dash.history_window_hours,
        "dashboard.history_window_hours",
        MIN_WINDOW_STEPS,
        MAX_WINDOW_STEPS,
        &mut w,
    );

    let d = &mut config.design;
    clamp_field(&mut d.infiltration_capacity_mm_hr, "design.infiltration_capacity_mm_hr", 0.0, 50.0, &mut w);
    clamp_field(&mut d.vertical_drainage_capacity_lps, "design.vertical_drainage_capacity_lps", 5.0, 120.0, &mut w);
    clamp_field(&mut d.storage_capacity_m3, "design.storage_capacity_m3", 50.0, 5000.0, &mut w);
    clamp_field(&mut d.clog_level_pct, "design.clog_level_pct", 0.0, 100.0, &mut w);
    clamp_field(&mut d.catchment_area_m2, "design.catchment_area_m2", 500.0, 200_000.0, &mut w);

    let a = &mut config.alerts;
    clamp_field(&mut a.tank_critical_pct, "alerts.tank_critical_pct", 70.0, 95.0, &mut w);
    clamp_field(&mut a.rain_spike_delta_mm_hr, "alerts.rain_spike_delta_mm_hr", 2.0, 20.0, &mut w);
    clamp_field(&mut a.flow_block_threshold_lps, "alerts.flow_block_threshold_lps", 0.0, 50.0, &mut w);
    clamp_field(&mut a.zone_high_risk_score, "alerts.zone_high_risk_score", 0, 100, &mut w);

    w
}

// ============================================================================
// Tests
// ============================================================================
