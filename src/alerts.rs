//! Alert evaluation
//!
//! Compares the current reading against the previous one and the operator
//! thresholds. Re-evaluated from scratch on every tick: the only input
//! carried between ticks is the previous reading, owned by the pipeline
//! driver.

use serde::{Deserialize, Serialize};

use crate::types::{AlertKind, AlertRecord, DesignParameters, Reading, Severity};

/// Risk score that raises the system to WARNING.
pub const WARNING_RISK: u8 = 60;

/// Risk score that raises the system to CRITICAL (and emits a high-risk alert).
pub const CRITICAL_RISK: u8 = 80;

/// Tank fill above the critical threshold that escalates to CRITICAL (%).
pub const TANK_ESCALATION_MARGIN_PCT: f64 = 8.0;

/// Upper cap on the tank escalation level (%).
pub const TANK_ESCALATION_CAP_PCT: f64 = 95.0;

/// Flow below the block threshold that escalates to CRITICAL (L/s).
pub const FLOW_ESCALATION_MARGIN_LPS: f64 = 3.0;

/// Raw threshold conditions of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertConditions {
    /// Rain change since the previous reading (mm/hr)
    pub rain_delta: f64,
    pub rain_spike: bool,
    pub flow_blocked: bool,
    pub tank_critical: bool,
}

/// Severity plus the alert records of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvaluation {
    pub severity: Severity,
    pub conditions: AlertConditions,
    pub alerts: Vec<AlertRecord>,
}

/// Evaluate severity and alerts for `current` against `previous`.
///
/// Pass the current reading as `previous` when there is no earlier reading;
/// the rain delta is then zero and no spike fires.
pub fn evaluate(
    current: &Reading,
    previous: &Reading,
    risk: u8,
    params: &DesignParameters,
) -> AlertEvaluation {
    let conditions = check_conditions(current, previous, params);
    let severity = classify_severity(current, risk, &conditions, params);
    let alerts = build_alerts(current, risk, &conditions);

    AlertEvaluation {
        severity,
        conditions,
        alerts,
    }
}

pub fn check_conditions(
    current: &Reading,
    previous: &Reading,
    params: &DesignParameters,
) -> AlertConditions {
    let rain_delta = current.rain_rate - previous.rain_rate;
    AlertConditions {
        rain_delta,
        rain_spike: rain_delta >= params.rain_spike_threshold,
        flow_blocked: current.flow_rate <= params.flow_block_threshold,
        tank_critical: current.tank_fill >= params.tank_critical_pct,
    }
}

/// OK -> WARNING -> CRITICAL; each stage can only raise the level.
pub fn classify_severity(
    current: &Reading,
    risk: u8,
    conditions: &AlertConditions,
    params: &DesignParameters,
) -> Severity {
    let mut severity = Severity::Ok;

    if risk >= WARNING_RISK
        || conditions.tank_critical
        || conditions.flow_blocked
        || conditions.rain_spike
    {
        severity = severity.max(Severity::Warning);
    }

    let tank_escalation =
        TANK_ESCALATION_CAP_PCT.min(params.tank_critical_pct + TANK_ESCALATION_MARGIN_PCT);
    let flow_escalation = (params.flow_block_threshold - FLOW_ESCALATION_MARGIN_LPS).max(0.0);
    if risk >= CRITICAL_RISK
        || current.tank_fill >= tank_escalation
        || current.flow_rate <= flow_escalation
    {
        severity = severity.max(Severity::Critical);
    }

    severity
}

/// One record per true condition, or a single stable record.
pub fn build_alerts(current: &Reading, risk: u8, conditions: &AlertConditions) -> Vec<AlertRecord> {
    let mut alerts = Vec::new();

    if conditions.tank_critical {
        alerts.push(AlertRecord::new(
            AlertKind::TankHigh,
            format!("Tank at {:.1}%", current.tank_fill),
        ));
    }
    if conditions.flow_blocked {
        alerts.push(AlertRecord::new(
            AlertKind::FlowRestricted,
            format!("Flow at {:.2} L/s", current.flow_rate),
        ));
    }
    if conditions.rain_spike {
        alerts.push(AlertRecord::new(
            AlertKind::RainSpike,
            format!("Increase: {:.2} mm/h", conditions.rain_delta),
        ));
    }
    if risk >= CRITICAL_RISK {
        alerts.push(AlertRecord::new(
            AlertKind::HighRisk,
            format!("Risk score {risk}/100"),
        ));
    }

    if alerts.is_empty() {
        alerts.push(AlertRecord::new(
            AlertKind::Stable,
            "All parameters within safe limits.",
        ));
    }
    alerts
}
