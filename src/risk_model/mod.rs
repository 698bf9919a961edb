//! Flood Risk Model
//!
//! Deterministic scoring of one reading against the site design parameters.
//! Produces a 0-100 risk score plus every intermediate quantity so the
//! dashboard can show how the score was reached.
//!
//! ## Model Stages
//!
//! ```text
//! rain ──► effective infiltration ──► runoff ──► demand ─┐
//!                                                       ├─► unmet demand
//! vertical drains + observed flow ──► conveyance ───────┘
//! tank fill + storage size ──► buffer / penalty
//!
//! risk = 0.35·rain_score + 0.40·unmet_score + 0.25·tank_score + vulnerability
//! ```
//!
//! Every component is clamped, so the score is total over any finite input.

use crate::types::{DesignParameters, Reading, RiskBreakdown};

// ============================================================================
// Model Constants
// ============================================================================

/// Maximum infiltration loss at full clogging (70%).
pub const INFILTRATION_CLOG_LOSS: f64 = 0.70;

/// Maximum vertical drain capacity loss at full clogging.
pub const VERTICAL_CLOG_LOSS: f64 = 0.50;

/// Maximum observed-flow capacity loss at full clogging.
pub const FLOW_CLOG_LOSS: f64 = 0.35;

/// mm·m²/hr -> L/s
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Storage size that counts as a full buffer (m³).
pub const REFERENCE_STORAGE_M3: f64 = 5000.0;

/// Rain intensity that saturates the rain component (mm/hr).
pub const RAIN_CEILING_MM_HR: f64 = 20.0;

/// Floor of the critical unmet-flow reference (L/s).
pub const MIN_CRITICAL_UNMET_LPS: f64 = 10.0;

/// Critical unmet flow per m² of catchment (L/s).
pub const CRITICAL_UNMET_PER_M2: f64 = 0.001;

/// Tank score weighting: `base + span * penalty`.
pub const TANK_WEIGHT_BASE: f64 = 0.60;
pub const TANK_WEIGHT_SPAN: f64 = 0.40;

/// Vulnerability points at full clogging.
pub const MAX_VULNERABILITY: f64 = 40.0;

/// Composite weights.
pub const WEIGHT_RAIN: f64 = 0.35;
pub const WEIGHT_UNMET: f64 = 0.40;
pub const WEIGHT_TANK: f64 = 0.25;

// ============================================================================
// Scoring
// ============================================================================

/// Score one reading against the design parameters.
///
/// Pure and deterministic. Negative or non-finite raw inputs are treated as
/// zero; every clamp is idempotent, so pre-clamped config values pass
/// through unchanged.
pub fn score(reading: &Reading, params: &DesignParameters) -> RiskBreakdown {
    let rain = non_negative(reading.rain_rate);
    let flow = non_negative(reading.flow_rate);
    let tank_fill = non_negative(reading.tank_fill);

    let clog = unit(params.clog_fraction);
    let infiltration = non_negative(params.infiltration_capacity);
    let vertical = non_negative(params.vertical_drainage_capacity);
    let storage = non_negative(params.storage_capacity);
    let area = non_negative(params.catchment_area);

    // Hydraulics
    let effective_infiltration = infiltration * (1.0 - INFILTRATION_CLOG_LOSS * clog);
    let runoff = (rain - effective_infiltration).max(0.0);
    let demand = runoff * area / SECONDS_PER_HOUR;
    let conveyance_capacity =
        vertical * (1.0 - VERTICAL_CLOG_LOSS * clog) + flow * (1.0 - FLOW_CLOG_LOSS * clog);
    let unmet_demand = (demand - conveyance_capacity).max(0.0);

    // Storage buffer: log-scaled so capacity has diminishing returns
    let tank_fraction = unit(tank_fill / 100.0);
    let storage_norm = unit(storage.ln_1p() / REFERENCE_STORAGE_M3.ln_1p());
    let buffer = (1.0 - tank_fraction) * storage_norm;
    let penalty = 1.0 - buffer;

    // Components
    let rain_score = percent(rain / RAIN_CEILING_MM_HR * 100.0);
    let critical_unmet = MIN_CRITICAL_UNMET_LPS.max(CRITICAL_UNMET_PER_M2 * area);
    let unmet_score = percent(unmet_demand / critical_unmet * 100.0);
    let tank_score =
        percent(tank_fraction * 100.0 * (TANK_WEIGHT_BASE + TANK_WEIGHT_SPAN * penalty));
    let vulnerability_score = (MAX_VULNERABILITY * clog).clamp(0.0, MAX_VULNERABILITY);

    let composite = WEIGHT_RAIN * rain_score
        + WEIGHT_UNMET * unmet_score
        + WEIGHT_TANK * tank_score
        + vulnerability_score;

    RiskBreakdown {
        risk: to_score(composite),
        effective_infiltration,
        runoff,
        demand,
        conveyance_capacity,
        unmet_demand,
        rain_score,
        unmet_score,
        tank_score,
        vulnerability_score,
    }
}

/// Round then clamp into an integer 0-100 score.
pub fn to_score(value: f64) -> u8 {
    if !value.is_finite() {
        return if value == f64::INFINITY { 100 } else { 0 };
    }
    // Clamped to [0, 100] first, so the cast is lossless.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = value.round().clamp(0.0, 100.0) as u8;
    score
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(rain: f64, flow: f64, tank: f64) -> Reading {
        Reading::new(Utc::now(), rain, flow, tank)
    }

    fn params_with_clog(clog_pct: f64) -> DesignParameters {
        DesignParameters {
            clog_fraction: DesignParameters::clog_fraction_from_pct(clog_pct),
            ..DesignParameters::default()
        }
    }

    #[test]
    fn test_dry_clean_empty_scores_zero() {
        let b = score(&reading(0.0, 10.0, 0.0), &params_with_clog(0.0));
        assert_eq!(b.runoff, 0.0);
        assert_eq!(b.demand, 0.0);
        assert_eq!(b.unmet_demand, 0.0);
        assert_eq!(b.rain_score, 0.0);
        assert_eq!(b.unmet_score, 0.0);
        assert_eq!(b.tank_score, 0.0);
        assert_eq!(b.vulnerability_score, 0.0);
        assert_eq!(b.risk, 0);
    }

    #[test]
    fn test_saturation_clamps_at_100() {
        let params = DesignParameters {
            catchment_area: 200_000.0,
            infiltration_capacity: 0.0,
            vertical_drainage_capacity: 5.0,
            storage_capacity: 50.0,
            ..params_with_clog(100.0)
        };
        let b = score(&reading(20.0, 0.0, 100.0), &params);
        assert_eq!(b.rain_score, 100.0);
        assert_eq!(b.unmet_score, 100.0);
        assert_eq!(b.tank_score, 100.0);
        assert_eq!(b.vulnerability_score, 40.0);
        assert_eq!(b.risk, 100);
    }

    #[test]
    fn test_hand_computed_default_case() {
        // rain 10, flow 30, tank 50, default site (clog 18%)
        let b = score(&reading(10.0, 30.0, 50.0), &DesignParameters::default());

        let clog = 0.18;
        let eff = 18.0 * (1.0 - 0.70 * clog);
        assert!((b.effective_infiltration - eff).abs() < 1e-9);
        // Rain below infiltration: no runoff
        assert_eq!(b.runoff, 0.0);
        assert_eq!(b.unmet_demand, 0.0);
        assert!((b.conveyance_capacity - (45.0 * 0.91 + 30.0 * (1.0 - 0.35 * clog))).abs() < 1e-9);
        assert!((b.rain_score - 50.0).abs() < 1e-9);

        let storage_norm = 1200f64.ln_1p() / 5000f64.ln_1p();
        let penalty = 1.0 - 0.5 * storage_norm;
        let tank_score = 50.0 * (0.60 + 0.40 * penalty);
        assert!((b.tank_score - tank_score).abs() < 1e-9);

        let expected = (0.35 * 50.0 + 0.25 * tank_score + 40.0 * clog).round() as u8;
        assert_eq!(b.risk, expected);
    }

    #[test]
    fn test_runoff_and_unmet_demand() {
        let params = DesignParameters {
            infiltration_capacity: 10.0,
            vertical_drainage_capacity: 20.0,
            catchment_area: 36_000.0,
            ..params_with_clog(0.0)
        };
        // runoff 5 mm/hr over 36 000 m² = 50 L/s; conveyance 20 + 10 = 30
        let b = score(&reading(15.0, 10.0, 0.0), &params);
        assert!((b.runoff - 5.0).abs() < 1e-9);
        assert!((b.demand - 50.0).abs() < 1e-9);
        assert!((b.conveyance_capacity - 30.0).abs() < 1e-9);
        assert!((b.unmet_demand - 20.0).abs() < 1e-9);
        // critical unmet = max(10, 36) = 36
        assert!((b.unmet_score - 20.0 / 36.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_risk_always_in_range() {
        let rains = [0.0, 0.5, 3.0, 12.0, 20.0, 45.0, 200.0];
        let tanks = [0.0, 25.0, 50.0, 85.0, 100.0];
        let clogs = [0.0, 18.0, 50.0, 100.0];
        let areas = [500.0, 25_000.0, 200_000.0];
        for &rain in &rains {
            for &tank in &tanks {
                for &clog in &clogs {
                    for &area in &areas {
                        let params = DesignParameters {
                            catchment_area: area,
                            ..params_with_clog(clog)
                        };
                        let b = score(&reading(rain, 12.0, tank), &params);
                        assert!(b.risk <= 100);
                        assert!(b.rain_score >= 0.0 && b.rain_score <= 100.0);
                        assert!(b.unmet_score >= 0.0 && b.unmet_score <= 100.0);
                        assert!(b.tank_score >= 0.0 && b.tank_score <= 100.0);
                        assert!(b.vulnerability_score >= 0.0 && b.vulnerability_score <= 40.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_monotonic_in_rain() {
        let params = params_with_clog(30.0);
        let mut last = 0u8;
        for step in 0..=60 {
            let rain = f64::from(step) * 0.5;
            let b = score(&reading(rain, 15.0, 40.0), &params);
            assert!(b.risk >= last, "risk fell from {} to {} at rain {}", last, b.risk, rain);
            last = b.risk;
        }
    }

    #[test]
    fn test_monotonic_in_clog() {
        let mut last = 0u8;
        for clog_pct in 0..=100 {
            let b = score(&reading(14.0, 15.0, 60.0), &params_with_clog(f64::from(clog_pct)));
            assert!(b.risk >= last, "risk fell from {} to {} at clog {}%", last, b.risk, clog_pct);
            last = b.risk;
        }
    }

    #[test]
    fn test_storage_never_increases_risk() {
        let mut last = 100u8;
        for storage in (0..=5000).step_by(50) {
            let params = DesignParameters {
                storage_capacity: f64::from(storage),
                ..DesignParameters::default()
            };
            let b = score(&reading(8.0, 20.0, 70.0), &params);
            assert!(b.risk <= last, "risk rose from {} to {} at storage {}", last, b.risk, storage);
            last = b.risk;
        }
    }

    #[test]
    fn test_zero_storage_is_defined() {
        let params = DesignParameters {
            storage_capacity: 0.0,
            ..DesignParameters::default()
        };
        let b = score(&reading(5.0, 20.0, 50.0), &params);
        // No buffer at all: penalty = 1, tank score = fill
        assert!((b.tank_score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let r = reading(11.3, 22.7, 64.2);
        let p = DesignParameters::default();
        assert_eq!(score(&r, &p), score(&r, &p));
    }

    #[test]
    fn test_double_clamped_params_unchanged() {
        let p = params_with_clog(42.0);
        let clamped = DesignParameters {
            clog_fraction: p.clog_fraction.clamp(0.0, 1.0),
            ..p
        };
        let r = reading(9.0, 18.0, 77.0);
        assert_eq!(score(&r, &p), score(&r, &clamped));
    }

    #[test]
    fn test_non_finite_inputs_treated_as_zero() {
        let b = score(&reading(f64::NAN, f64::INFINITY, -10.0), &DesignParameters::default());
        assert_eq!(b.rain_score, 0.0);
        assert_eq!(b.tank_score, 0.0);
        assert!(b.risk <= 100);
    }

    #[test]
    fn test_to_score_round_then_clamp() {
        assert_eq!(to_score(49.5), 50);
        assert_eq!(to_score(49.49), 49);
        assert_eq!(to_score(-3.0), 0);
        assert_eq!(to_score(180.0), 100);
        assert_eq!(to_score(f64::NAN), 0);
        assert_eq!(to_score(f64::INFINITY), 100);
    }
}
