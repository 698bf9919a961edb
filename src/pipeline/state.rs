//! Application State and System Status
//!
//! Shared state for the refresh loop and API handlers.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DashboardSnapshot, DataSource, Severity};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state accessible from API handlers and the refresh loop.
///
/// Wrapped in `Arc<RwLock<>>`. The refresh loop is the only writer; it
/// replaces `latest` whole, so readers never see a partially updated tick.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Process start, for uptime reporting
    pub uptime: Instant,

    /// Display name of the monitored site
    pub site_name: String,

    /// Current system status
    pub status: SystemStatus,

    /// Most recent complete tick
    pub latest: Option<Arc<DashboardSnapshot>>,

    /// Ticks completed since startup
    pub ticks: u64,

    /// Ticks that substituted synthetic data for a rejected dataset
    pub fallback_ticks: u64,

    pub last_tick_time: Option<DateTime<Utc>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            uptime: Instant::now(),
            site_name: String::new(),
            status: SystemStatus::Initializing,
            latest: None,
            ticks: 0,
            fallback_ticks: 0,
            last_tick_time: None,
        }
    }
}

impl AppState {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            ..Self::default()
        }
    }

    /// Publish a freshly computed snapshot.
    pub fn publish(&mut self, snapshot: DashboardSnapshot) -> Arc<DashboardSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.ticks += 1;
        if snapshot.data_source == DataSource::SyntheticFallback {
            self.fallback_ticks += 1;
        }
        self.last_tick_time = Some(snapshot.computed_at);
        self.status = SystemStatus::from_snapshot(&snapshot);
        self.latest = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.uptime.elapsed().as_secs()
    }
}

/// System operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    /// No tick completed yet
    Initializing,
    /// Normal operation
    Monitoring,
    /// Latest tick is CRITICAL
    Alert,
    /// Operator dataset rejected, running on synthetic data
    Degraded,
}

impl SystemStatus {
    pub fn from_snapshot(snapshot: &DashboardSnapshot) -> Self {
        if snapshot.severity == Severity::Critical {
            SystemStatus::Alert
        } else if snapshot.data_source == DataSource::SyntheticFallback {
            SystemStatus::Degraded
        } else {
            SystemStatus::Monitoring
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemStatus::Initializing => write!(f, "Initializing"),
            SystemStatus::Monitoring => write!(f, "Monitoring"),
            SystemStatus::Alert => write!(f, "Alert"),
            SystemStatus::Degraded => write!(f, "Degraded"),
        }
    }
}
