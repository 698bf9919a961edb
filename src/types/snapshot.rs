//! Per-tick dashboard snapshot handed to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertRecord, Reading, RiskBand, RiskBreakdown, Severity, ZoneMapPoint, ZoneRiskRow};

/// Where the readings of a tick came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Stochastic demo generator
    #[default]
    Synthetic,
    /// Operator-supplied CSV dataset
    Csv,
    /// CSV was configured but malformed; synthetic data substituted
    SyntheticFallback,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Synthetic => write!(f, "Simulated (demo)"),
            DataSource::Csv => write!(f, "Uploaded CSV"),
            DataSource::SyntheticFallback => write!(f, "Simulated (CSV rejected)"),
        }
    }
}

/// Headline KPI values, rounded for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Rain intensity (mm/h), 2 dp
    pub rain_mm_per_hr: f64,
    /// Drain flow (L/s), 2 dp
    pub drain_flow_lps: f64,
    /// Tank fill (%), 1 dp
    pub tank_fill_pct: f64,
    /// Flood risk score (0-100)
    pub risk: u8,
}

impl Kpis {
    pub fn from_reading(reading: &Reading, risk: u8) -> Self {
        Self {
            rain_mm_per_hr: round_to(reading.rain_rate, 2),
            drain_flow_lps: round_to(reading.flow_rate, 2),
            tank_fill_pct: round_to(reading.tank_fill, 1),
            risk,
        }
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Everything one refresh tick produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Monotonic tick counter (1 = first tick)
    pub tick: u64,
    pub computed_at: DateTime<Utc>,
    pub data_source: DataSource,
    /// Why the configured CSV was rejected, when `data_source` is a fallback
    pub fallback_reason: Option<String>,
    pub latest: Reading,
    pub previous: Reading,
    pub kpis: Kpis,
    pub breakdown: RiskBreakdown,
    pub risk_band: RiskBand,
    pub severity: Severity,
    pub alerts: Vec<AlertRecord>,
    pub zones: Vec<ZoneRiskRow>,
    pub zone_map: Vec<ZoneMapPoint>,
    /// Rolling window, oldest first
    pub window: Vec<Reading>,
}
