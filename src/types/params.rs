//! Static infrastructure design parameters and alert thresholds

use serde::{Deserialize, Serialize};

/// Operator-configured parameters injected into every model call.
///
/// Built from [`MonitorConfig`](crate::config::MonitorConfig) once per tick,
/// after the config layer has clamped every value into its domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignParameters {
    /// Permeable surface infiltration capacity (mm/hr)
    pub infiltration_capacity: f64,
    /// Vertical drainage capacity (L/s)
    pub vertical_drainage_capacity: f64,
    /// Underground storage capacity (m³)
    pub storage_capacity: f64,
    /// Blockage level, 0.0-1.0
    pub clog_fraction: f64,
    /// Catchment area served (m²), always > 0
    pub catchment_area: f64,
    /// Tank fill at or above this is critical (%)
    pub tank_critical_pct: f64,
    /// Rain increase between consecutive readings that counts as a spike (mm/hr)
    pub rain_spike_threshold: f64,
    /// Drain flow at or below this is treated as blocked (L/s)
    pub flow_block_threshold: f64,
    /// Zone scores at or above this are flagged HIGH
    pub zone_high_risk_threshold: u8,
}

impl DesignParameters {
    /// Convert an operator clog percentage (0-100) into a clog fraction.
    ///
    /// Non-finite input maps to 0.
    pub fn clog_fraction_from_pct(clog_pct: f64) -> f64 {
        if clog_pct.is_finite() {
            (clog_pct / 100.0).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for DesignParameters {
    fn default() -> Self {
        Self {
            infiltration_capacity: 18.0,
            vertical_drainage_capacity: 45.0,
            storage_capacity: 1200.0,
            clog_fraction: Self::clog_fraction_from_pct(18.0),
            catchment_area: 25_000.0,
            tank_critical_pct: 85.0,
            rain_spike_threshold: 6.0,
            flow_block_threshold: 8.0,
            zone_high_risk_threshold: 70,
        }
    }
}
