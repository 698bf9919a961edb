//! Hydrological sensor reading

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time step of hydrological data.
///
/// Serialized field names match the ingestion CSV columns so a JSON export
/// and an uploaded dataset describe readings the same way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Sample time (UTC)
    pub timestamp: DateTime<Utc>,

    /// Rainfall intensity (mm/hr), >= 0
    #[serde(rename = "rain_mm_per_hr")]
    pub rain_rate: f64,

    /// Observed drain flow (L/s), >= 0
    #[serde(rename = "drain_flow_Lps")]
    pub flow_rate: f64,

    /// Storage tank fill level (%), 0-100
    #[serde(rename = "tank_fill_pct")]
    pub tank_fill: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, rain_rate: f64, flow_rate: f64, tank_fill: f64) -> Self {
        Self {
            timestamp,
            rain_rate,
            flow_rate,
            tank_fill,
        }
    }
}
