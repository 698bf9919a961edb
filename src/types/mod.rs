//! Shared data structures for flood & drainage monitoring
//!
//! This module defines the core types for the risk pipeline:
//! - Ingestion: Reading (rain / drain flow / tank fill sample)
//! - Risk model: DesignParameters in, RiskBreakdown out
//! - Zone allocator: ZoneDefinition catalog, ZoneRiskRow table
//! - Alert evaluator: Severity, AlertRecord
//! - Presentation: DashboardSnapshot (everything one refresh tick produces)

mod reading;
mod params;
mod risk;
mod zone;
mod alert;
mod snapshot;

pub use reading::*;
pub use params::*;
pub use risk::*;
pub use zone::*;
pub use alert::*;
pub use snapshot::*;
