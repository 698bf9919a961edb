//! Processing Pipeline Module
//!
//! ```text
//! RefreshLoop (every 2-30 s)
//!   ├─ load window from ReadingSource (synthetic fallback on bad data)
//!   ├─ PipelineDriver::tick  -> DashboardSnapshot
//!   └─ AppState::publish     -> served by the API
//! ```

mod driver;
mod state;
pub mod processing_loop;

pub use driver::PipelineDriver;
pub use state::*;
