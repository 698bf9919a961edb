//! Drainage Monitor: flood-risk scoring for permeable drainage infrastructure
//!
//! Turns rain, drain-flow and storage-tank readings plus site design features
//! into a 0-100 flood-risk score, a ranked per-zone risk table and a set of
//! operational alerts.
//!
//! ## Architecture
//!
//! - **Acquisition**: synthetic demo generator and CSV datasets behind one trait
//! - **Risk Model**: multi-factor hydrological score with intermediate quantities
//! - **Zones**: distributes site risk over six infrastructure zones
//! - **Alerts**: threshold and delta rules producing severity and alert records
//! - **Pipeline**: per-tick driver and the timed refresh loop
//! - **API**: axum JSON endpoints for the dashboard

pub mod acquisition;
pub mod alerts;
pub mod api;
pub mod config;
pub mod pipeline;
pub mod risk_model;
pub mod types;
pub mod zones;

// Re-export configuration
pub use config::{ConfigHandle, MonitorConfig};

// Re-export commonly used types
pub use types::{
    AlertKind, AlertRecord, DashboardSnapshot, DataSource, DesignParameters, Reading, RiskBand,
    RiskBreakdown, Severity, ZoneRiskRow, ZoneStatus,
};

pub use pipeline::PipelineDriver;
