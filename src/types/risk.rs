//! Risk model output types

use serde::{Deserialize, Serialize};

/// Flood risk score plus every intermediate engineering quantity.
///
/// Recomputed on each tick and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    /// Composite flood risk score (0-100)
    pub risk: u8,
    /// Infiltration capacity after clogging degradation (mm/hr)
    pub effective_infiltration: f64,
    /// Rainfall exceeding effective infiltration (mm/hr)
    pub runoff: f64,
    /// Volumetric flow the drainage must carry (L/s)
    pub demand: f64,
    /// Vertical drain + observed flow capacity after clogging (L/s)
    pub conveyance_capacity: f64,
    /// Demand the conveyance cannot carry (L/s)
    pub unmet_demand: f64,
    /// Rain component, 0-100
    pub rain_score: f64,
    /// Unmet demand component, 0-100
    pub unmet_score: f64,
    /// Tank fullness component, 0-100
    pub tank_score: f64,
    /// Clogging vulnerability points, 0-40
    pub vulnerability_score: f64,
}

/// Colour band of a risk score, as drawn on the gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskBand {
    /// 0-39
    Low,
    /// 40-69
    Elevated,
    /// 70-100
    High,
}

impl RiskBand {
    pub fn from_score(risk: u8) -> Self {
        match risk {
            0..=39 => RiskBand::Low,
            40..=69 => RiskBand::Elevated,
            _ => RiskBand::High,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskBand::Low => write!(f, "Low"),
            RiskBand::Elevated => write!(f, "Elevated"),
            RiskBand::High => write!(f, "High"),
        }
    }
}
