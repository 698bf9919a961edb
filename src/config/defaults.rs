//! System-wide default constants.
//!
//! Centralises magic numbers used outside the scoring model.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DRAINAGE_CONFIG";

/// Config file looked up in the current working directory.
pub const LOCAL_CONFIG_FILE: &str = "drainage_config.toml";

// ============================================================================
// Pipeline
// ============================================================================

/// Smallest rolling window (readings).
pub const MIN_WINDOW_STEPS: usize = 6;

/// Largest rolling window (readings). 72 = 3 days at hourly steps.
pub const MAX_WINDOW_STEPS: usize = 72;

/// Rows returned by the raw sensor feed when no limit is given.
pub const RAW_FEED_ROWS: usize = 24;

// ============================================================================
// Refresh Loop
// ============================================================================

/// Fastest allowed refresh interval (seconds).
pub const MIN_REFRESH_SECS: u64 = 2;

/// Slowest allowed refresh interval (seconds).
pub const MAX_REFRESH_SECS: u64 = 30;

/// Tick duration above which a warning is logged (ms).
pub const SLOW_TICK_WARN_MS: u128 = 250;

// ============================================================================
// HTTP Server
// ============================================================================

/// Default bind address.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
