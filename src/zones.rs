//! Zone risk allocation
//!
//! Spreads the site-level hydraulic stress (runoff and unmet demand) across
//! the fixed zone catalog. Less pervious and more clog-sensitive zones score
//! higher. The result is a relative ranking, not an absolute probability.

use crate::risk_model::to_score;
use crate::types::{RiskBreakdown, ZoneDefinition, ZoneMapPoint, ZoneRiskRow, ZoneStatus};

/// The six monitored zones, in catalog order (used as the sort tie-break).
pub const ZONE_CATALOG: [ZoneDefinition; 6] = [
    ZoneDefinition {
        name: "Permeable Footpath Segment 1",
        permeability_factor: 1.15,
        clog_sensitivity: 1.00,
    },
    ZoneDefinition {
        name: "Permeable Footpath Segment 2 (High footfall)",
        permeability_factor: 0.90,
        clog_sensitivity: 1.25,
    },
    ZoneDefinition {
        name: "Station Frontage Runoff Edge",
        permeability_factor: 0.75,
        clog_sensitivity: 1.10,
    },
    ZoneDefinition {
        name: "Drain Inlet Cluster",
        permeability_factor: 0.60,
        clog_sensitivity: 1.35,
    },
    ZoneDefinition {
        name: "Underpass / Low Point",
        permeability_factor: 0.50,
        clog_sensitivity: 1.15,
    },
    ZoneDefinition {
        name: "Storage Access & Service Bay",
        permeability_factor: 0.65,
        clog_sensitivity: 1.05,
    },
];

/// Schematic site grid positions `(x, y)`, filled in rank order.
pub const ZONE_MAP_LAYOUT: [(u8, u8); 6] = [(0, 2), (1, 2), (2, 2), (0, 1), (1, 1), (2, 1)];

/// Score every catalog zone and return the table ranked highest first.
///
/// Ties keep catalog order (stable sort). Deterministic.
pub fn allocate_zones(
    breakdown: &RiskBreakdown,
    clog_fraction: f64,
    zone_high_risk_threshold: u8,
) -> Vec<ZoneRiskRow> {
    let clog = if clog_fraction.is_finite() {
        clog_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let base = 0.55 * (breakdown.unmet_demand * 4.0) + 0.45 * (breakdown.runoff * 4.0);

    let mut rows: Vec<ZoneRiskRow> = ZONE_CATALOG
        .iter()
        .map(|zone| {
            let permeability_multiplier = 1.15 - 0.25 * zone.permeability_factor;
            let clog_multiplier = 1.0 + clog * (0.8 * zone.clog_sensitivity);
            let risk_score = to_score(base * permeability_multiplier * clog_multiplier);
            let status = if risk_score >= zone_high_risk_threshold {
                ZoneStatus::High
            } else {
                ZoneStatus::Ok
            };
            ZoneRiskRow {
                zone_name: zone.name.to_string(),
                risk_score,
                status,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));

    tracing::trace!(
        base = base,
        top_zone = %rows.first().map_or("", |r| r.zone_name.as_str()),
        "Zone table allocated"
    );
    rows
}

/// Place ranked zones on the 3x2 schematic site grid.
pub fn zone_map(rows: &[ZoneRiskRow]) -> Vec<ZoneMapPoint> {
    rows.iter()
        .zip(ZONE_MAP_LAYOUT.iter())
        .map(|(row, &(x, y))| ZoneMapPoint {
            zone_name: row.zone_name.clone(),
            risk_score: row.risk_score,
            status: row.status,
            x,
            y,
        })
        .collect()
}
