//! Synthetic hydrological signal generator
//!
//! Produces a demo window of readings:
//! - Rain: N(2.0, 1.6) mm/hr, clamped at 0
//! - Demo spike: one step in the final third gets +U[7, 13] mm/hr
//! - Flow: 10 + 2.5·rain + N(0, 1) L/s, clamped at 0
//! - Tank: running accumulation `tank + 1.2·rain - 0.08·flow`, clamped 0-100,
//!   seeded at U[22, 48] %

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::types::{round_to, Reading};

/// Mean rain intensity (mm/hr)
pub const RAIN_MEAN: f64 = 2.0;
/// Rain intensity standard deviation (mm/hr)
pub const RAIN_STD: f64 = 1.6;
/// Demo spike magnitude range (mm/hr)
pub const SPIKE_RANGE: std::ops::RangeInclusive<f64> = 7.0..=13.0;
/// Flow baseline (L/s)
pub const FLOW_BASE: f64 = 10.0;
/// Flow response per mm/hr of rain (L/s)
pub const FLOW_PER_RAIN: f64 = 2.5;
/// Flow noise standard deviation (L/s)
pub const FLOW_NOISE_STD: f64 = 1.0;
/// Tank fill gained per mm/hr of rain (%)
pub const TANK_FILL_PER_RAIN: f64 = 1.2;
/// Tank fill drained per L/s of flow (%)
pub const TANK_DRAIN_PER_FLOW: f64 = 0.08;
/// Initial tank fill range (%)
pub const TANK_SEED_RANGE: std::ops::RangeInclusive<f64> = 22.0..=48.0;

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticConfig {
    /// Time between readings
    pub step: Duration,
    /// Inject one flood-like rain spike for demonstration
    pub demo_spike: bool,
    /// Seed for reproducible output (entropy when `None`)
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            step: Duration::hours(1),
            demo_spike: true,
            seed: None,
        }
    }
}

pub struct SyntheticGenerator {
    rng: StdRng,
    config: SyntheticConfig,
}

impl SyntheticGenerator {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng, config }
    }

    /// Generate `n_steps` readings ending at the current step boundary.
    pub fn generate(&mut self, n_steps: usize) -> Vec<Reading> {
        let end = align_to_step(Utc::now(), self.config.step);
        self.generate_ending_at(n_steps, end)
    }

    /// Generate `n_steps` readings, oldest first, the last stamped `end`.
    pub fn generate_ending_at(&mut self, n_steps: usize, end: DateTime<Utc>) -> Vec<Reading> {
        if n_steps == 0 {
            return Vec::new();
        }

        let mut rain: Vec<f64> = (0..n_steps)
            .map(|_| (RAIN_MEAN + RAIN_STD * self.standard_normal()).max(0.0))
            .collect();

        if self.config.demo_spike && n_steps >= 3 {
            let start = n_steps - n_steps / 3;
            let idx = self.rng.gen_range(start..n_steps);
            let spike = self.rng.gen_range(SPIKE_RANGE);
            rain[idx] += spike;
            tracing::debug!(index = idx, spike_mm_hr = spike, "Injected demo rain spike");
        }

        let flow: Vec<f64> = rain
            .iter()
            .map(|r| {
                (FLOW_BASE + FLOW_PER_RAIN * r + FLOW_NOISE_STD * self.standard_normal()).max(0.0)
            })
            .collect();

        let mut tank = Vec::with_capacity(n_steps);
        tank.push(self.rng.gen_range(TANK_SEED_RANGE));
        for i in 1..n_steps {
            let next = tank[i - 1] + rain[i] * TANK_FILL_PER_RAIN - flow[i] * TANK_DRAIN_PER_FLOW;
            tank.push(next.clamp(0.0, 100.0));
        }

        let steps_back = i32::try_from(n_steps - 1).unwrap_or(i32::MAX);
        (0..n_steps)
            .map(|i| {
                let offset = steps_back - i32::try_from(i).unwrap_or(i32::MAX);
                Reading::new(
                    end - self.config.step * offset,
                    round_to(rain[i], 2),
                    round_to(flow[i], 2),
                    round_to(tank[i], 1),
                )
            })
            .collect()
    }

    fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}

/// Floor a time to a whole multiple of `step` since the epoch.
///
/// With an hourly step this is "now, truncated to the hour".
pub fn align_to_step(time: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let step_secs = step.num_seconds();
    if step_secs <= 0 {
        return time;
    }
    let aligned = time.timestamp().div_euclid(step_secs) * step_secs;
    Utc.timestamp_opt(aligned, 0).single().unwrap_or(time)
}
