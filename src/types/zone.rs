//! Zone catalog and per-zone risk rows

use serde::{Deserialize, Serialize};

/// A named physical zone of the drainage site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneDefinition {
    pub name: &'static str,
    /// Surface permeability; lower values are less pervious and score higher
    pub permeability_factor: f64,
    /// Amplifies the local effect of clogging
    pub clog_sensitivity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneStatus {
    Ok,
    High,
}

impl std::fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneStatus::Ok => write!(f, "OK"),
            ZoneStatus::High => write!(f, "HIGH"),
        }
    }
}

/// One row of the ranked zone table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRiskRow {
    pub zone_name: String,
    /// Relative zone risk (0-100)
    pub risk_score: u8,
    pub status: ZoneStatus,
}

/// A ranked zone placed on the schematic (non-geographic) site grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMapPoint {
    pub zone_name: String,
    pub risk_score: u8,
    pub status: ZoneStatus,
    pub x: u8,
    pub y: u8,
}
