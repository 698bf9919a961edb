//! Refresh loop: load window -> tick driver -> publish snapshot, on a timer.
//!
//! Each tick takes one config snapshot, so parameters changed mid-tick apply
//! from the next tick on. A changed refresh interval restarts the timer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AppState, PipelineDriver};
use crate::acquisition::{load_window, ReadingSource, SyntheticGenerator};
use crate::config::defaults::SLOW_TICK_WARN_MS;
use crate::config::ConfigHandle;
use crate::types::{DashboardSnapshot, Severity};

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub ticks: u64,
    pub fallback_ticks: u64,
    pub critical_ticks: u64,
}

impl std::fmt::Display for RefreshStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Refresh loop: {} ticks ({} on fallback data, {} critical)",
            self.ticks, self.fallback_ticks, self.critical_ticks
        )
    }
}

/// Owns everything one refresh tick needs.
///
/// Built with [`new()`](RefreshLoop::new), then consumed by
/// [`run()`](RefreshLoop::run).
pub struct RefreshLoop {
    driver: PipelineDriver,
    source: Box<dyn ReadingSource>,
    fallback: SyntheticGenerator,
    app_state: Arc<RwLock<AppState>>,
    config: ConfigHandle,
    cancel_token: CancellationToken,
    stats: RefreshStats,
}

impl RefreshLoop {
    pub fn new(
        source: Box<dyn ReadingSource>,
        app_state: Arc<RwLock<AppState>>,
        config: ConfigHandle,
        cancel_token: CancellationToken,
    ) -> Self {
        let snapshot = config.load();
        Self {
            driver: PipelineDriver::new(snapshot.window_size()),
            fallback: SyntheticGenerator::new(snapshot.synthetic_config()),
            source,
            app_state,
            config,
            cancel_token,
            stats: RefreshStats::default(),
        }
    }

    /// Run a single tick and publish its snapshot.
    pub async fn tick_once(&mut self) -> Option<Arc<DashboardSnapshot>> {
        let started = Instant::now();
        let config = self.config.load();

        self.driver.set_capacity(config.window_size());
        let load = load_window(self.source.as_mut(), &mut self.fallback, self.driver.capacity()).await;
        let fallback = load.fallback_reason.is_some();
        self.driver.replace_window(load.readings);

        let snapshot = self
            .driver
            .tick(&config.design_parameters(), load.source, load.fallback_reason)?;

        self.stats.ticks += 1;
        if fallback {
            self.stats.fallback_ticks += 1;
        }
        if snapshot.severity == Severity::Critical {
            self.stats.critical_ticks += 1;
        }

        let published = self.app_state.write().await.publish(snapshot);

        let elapsed = started.elapsed();
        if elapsed.as_millis() > SLOW_TICK_WARN_MS {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "Slow refresh tick");
        }
        debug!(
            tick = published.tick,
            source = %published.data_source,
            risk = published.breakdown.risk,
            severity = %published.severity,
            "Snapshot published"
        );

        Some(published)
    }

    /// Tick on the configured interval until cancelled.
    ///
    /// Returns final loop statistics.
    pub async fn run(mut self) -> RefreshStats {
        let mut period = self.config.load().refresh_interval();
        let mut interval = new_interval(period);

        info!(
            source = self.source.source_name(),
            refresh_secs = period.as_secs(),
            window = self.driver.capacity(),
            "Refresh loop started"
        );

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Refresh loop shutdown signal received");
                    break;
                }
                _ = interval.tick() => {}
            }

            self.tick_once().await;

            let configured = self.config.load().refresh_interval();
            if configured != period {
                info!(
                    from_secs = period.as_secs(),
                    to_secs = configured.as_secs(),
                    "Refresh interval changed"
                );
                period = configured;
                interval = new_interval(period);
                // The first tick of a new interval fires immediately
                interval.tick().await;
            }
        }

        info!("{}", self.stats);
        self.stats
    }
}

fn new_interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
