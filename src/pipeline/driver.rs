//! Pipeline Driver - one full recomputation per refresh tick
//!
//! ```text
//! window (oldest..latest) ──► latest + previous reading
//!                                  │
//!                                  ▼
//!                           risk_model::score ──► RiskBreakdown
//!                                  │
//!                    ┌─────────────┴─────────────┐
//!                    ▼                           ▼
//!          zones::allocate_zones        alerts::evaluate
//!                    │                           │
//!                    └───────► DashboardSnapshot ◄┘
//! ```
//!
//! The driver owns the only state that survives between ticks: the bounded
//! reading window, the previous reading and the last breakdown.

use std::collections::VecDeque;

use chrono::Utc;
use tracing::debug;

use crate::alerts;
use crate::config::defaults::MAX_WINDOW_STEPS;
use crate::risk_model;
use crate::types::{
    DashboardSnapshot, DataSource, DesignParameters, Kpis, Reading, RiskBand, RiskBreakdown,
};
use crate::zones;

pub struct PipelineDriver {
    /// Rolling window, oldest first
    window: VecDeque<Reading>,
    capacity: usize,
    /// Latest reading of the previous tick
    previous: Option<Reading>,
    last_breakdown: Option<RiskBreakdown>,
    ticks: u64,
}

impl PipelineDriver {
    /// Create a driver holding at most `capacity` readings (1..=72).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_WINDOW_STEPS);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            previous: None,
            last_breakdown: None,
            ticks: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resize the window, dropping the oldest readings if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.clamp(1, MAX_WINDOW_STEPS);
        self.trim();
    }

    /// Replace the whole window; only the newest `capacity` readings are kept.
    pub fn replace_window(&mut self, readings: Vec<Reading>) {
        self.window = readings.into();
        self.trim();
    }

    /// Append one reading, evicting the oldest when full.
    ///
    /// Readings not newer than the current latest are ignored and `false`
    /// is returned.
    pub fn push(&mut self, reading: Reading) -> bool {
        if let Some(last) = self.window.back() {
            if reading.timestamp <= last.timestamp {
                debug!(
                    timestamp = %reading.timestamp,
                    latest = %last.timestamp,
                    "Ignoring out-of-order reading"
                );
                return false;
            }
        }
        self.window.push_back(reading);
        self.trim();
        true
    }

    fn trim(&mut self) {
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    pub fn window(&self) -> &VecDeque<Reading> {
        &self.window
    }

    pub fn last_breakdown(&self) -> Option<&RiskBreakdown> {
        self.last_breakdown.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Reading compared against the latest for delta alerts.
    ///
    /// The second-newest window reading when there is one, else the latest of
    /// the previous tick if it is older, else the latest itself.
    fn previous_for(&self, latest: &Reading) -> Reading {
        let len = self.window.len();
        if len >= 2 {
            return self.window[len - 2];
        }
        match self.previous {
            Some(prev) if prev.timestamp < latest.timestamp => prev,
            _ => *latest,
        }
    }

    /// Run one full recomputation over the current window.
    ///
    /// Returns `None` only when the window is empty.
    pub fn tick(
        &mut self,
        params: &DesignParameters,
        data_source: DataSource,
        fallback_reason: Option<String>,
    ) -> Option<DashboardSnapshot> {
        let latest = *self.window.back()?;
        let previous = self.previous_for(&latest);

        let breakdown = risk_model::score(&latest, params);
        let zones = zones::allocate_zones(
            &breakdown,
            params.clog_fraction,
            params.zone_high_risk_threshold,
        );
        let zone_map = zones::zone_map(&zones);
        let evaluation = alerts::evaluate(&latest, &previous, breakdown.risk, params);

        self.ticks += 1;
        self.previous = Some(latest);
        self.last_breakdown = Some(breakdown);

        debug!(
            tick = self.ticks,
            risk = breakdown.risk,
            severity = %evaluation.severity,
            alerts = evaluation.alerts.len(),
            "Pipeline tick"
        );

        Some(DashboardSnapshot {
            tick: self.ticks,
            computed_at: Utc::now(),
            data_source,
            fallback_reason,
            latest,
            previous,
            kpis: Kpis::from_reading(&latest, breakdown.risk),
            breakdown,
            risk_band: RiskBand::from_score(breakdown.risk),
            severity: evaluation.severity,
            alerts: evaluation.alerts,
            zones,
            zone_map,
            window: self.window.iter().copied().collect(),
        })
    }
}
