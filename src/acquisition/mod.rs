//! Reading acquisition
//!
//! Provides a unified trait for obtaining the rolling window of readings from
//! different sources: the synthetic demo generator and operator CSV datasets.
//! A malformed dataset never stops the dashboard: [`load_window`] falls back
//! to synthetic data and reports why.

pub mod csv_reader;
pub mod synthetic;

pub use csv_reader::{parse_csv, read_csv_file, truncate_to_window, DataFormatError};
pub use synthetic::{SyntheticConfig, SyntheticGenerator};

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::types::{DataSource, Reading};

/// Trait abstracting where readings come from.
///
/// Called once per refresh tick with the configured window size.
#[async_trait]
pub trait ReadingSource: Send + 'static {
    /// Load the most recent `window` readings, oldest first.
    async fn load(&mut self, window: usize) -> Result<Vec<Reading>, DataFormatError>;

    /// Human-readable name for logging (e.g. "synthetic", "CSV").
    fn source_name(&self) -> &str;

    fn kind(&self) -> DataSource;
}

// ============================================================================
// Synthetic Source
// ============================================================================

/// Regenerates a fresh demo window on every load.
pub struct SyntheticSource {
    generator: SyntheticGenerator,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            generator: SyntheticGenerator::new(config),
        }
    }
}

#[async_trait]
impl ReadingSource for SyntheticSource {
    async fn load(&mut self, window: usize) -> Result<Vec<Reading>, DataFormatError> {
        Ok(self.generator.generate(window))
    }

    fn source_name(&self) -> &str {
        "synthetic"
    }

    fn kind(&self) -> DataSource {
        DataSource::Synthetic
    }
}

// ============================================================================
// CSV File Source
// ============================================================================

/// Re-reads a CSV dataset on every load so edits to the file show up on the
/// next tick.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReadingSource for CsvFileSource {
    async fn load(&mut self, window: usize) -> Result<Vec<Reading>, DataFormatError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DataFormatError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        let readings = parse_csv(&contents)?;
        Ok(truncate_to_window(readings, window))
    }

    fn source_name(&self) -> &str {
        "CSV"
    }

    fn kind(&self) -> DataSource {
        DataSource::Csv
    }
}

// ============================================================================
// Window Loading with Fallback
// ============================================================================

/// Result of loading one window.
#[derive(Debug, Clone)]
pub struct WindowLoad {
    pub readings: Vec<Reading>,
    pub source: DataSource,
    /// Set when the primary source was rejected
    pub fallback_reason: Option<String>,
}

/// Load a window from `source`, substituting synthetic data from `fallback`
/// if the source fails or yields nothing.
pub async fn load_window<S: ReadingSource + ?Sized>(
    source: &mut S,
    fallback: &mut SyntheticGenerator,
    window: usize,
) -> WindowLoad {
    let window = window.max(1);
    match source.load(window).await {
        Ok(readings) if !readings.is_empty() => WindowLoad {
            readings,
            source: source.kind(),
            fallback_reason: None,
        },
        Ok(_) => fall_back(fallback, window, DataFormatError::Empty.to_string(), source.source_name()),
        Err(e) => fall_back(fallback, window, e.to_string(), source.source_name()),
    }
}

fn fall_back(
    generator: &mut SyntheticGenerator,
    window: usize,
    reason: String,
    source_name: &str,
) -> WindowLoad {
    warn!(
        source = source_name,
        error = %reason,
        "Dataset rejected, substituting synthetic readings"
    );
    WindowLoad {
        readings: generator.generate(window),
        source: DataSource::SyntheticFallback,
        fallback_reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fallback() -> SyntheticGenerator {
        SyntheticGenerator::new(SyntheticConfig {
            seed: Some(7),
            ..SyntheticConfig::default()
        })
    }

    #[tokio::test]
    async fn test_synthetic_source_fills_window() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            seed: Some(1),
            ..SyntheticConfig::default()
        });
        let load = load_window(&mut source, &mut fallback(), 24).await;
        assert_eq!(load.readings.len(), 24);
        assert_eq!(load.source, DataSource::Synthetic);
        assert!(load.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn test_csv_source_truncates_to_window() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,rain_mm_per_hr,drain_flow_Lps,tank_fill_pct").unwrap();
        for hour in 0..10 {
            writeln!(file, "2026-03-01 {hour:02}:00:00,{hour}.0,15.0,40.0").unwrap();
        }
        file.flush().unwrap();

        let mut source = CsvFileSource::new(file.path());
        let load = load_window(&mut source, &mut fallback(), 6).await;
        assert_eq!(load.source, DataSource::Csv);
        assert_eq!(load.readings.len(), 6);
        assert_eq!(load.readings[0].rain_rate, 4.0);
        assert_eq!(load.readings[5].rain_rate, 9.0);
    }

    #[tokio::test]
    async fn test_malformed_csv_falls_back_to_synthetic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,rain_mm_per_hr,tank_fill_pct").unwrap();
        writeln!(file, "2026-03-01 10:00:00,1.0,40.0").unwrap();
        file.flush().unwrap();

        let mut source = CsvFileSource::new(file.path());
        let load = load_window(&mut source, &mut fallback(), 12).await;
        assert_eq!(load.source, DataSource::SyntheticFallback);
        assert_eq!(load.readings.len(), 12);
        let reason = load.fallback_reason.unwrap();
        assert!(reason.contains("drain_flow_Lps"), "reason: {reason}");
    }

    #[tokio::test]
    async fn test_missing_file_falls_back() {
        let mut source = CsvFileSource::new("/nonexistent/feed.csv");
        let load = load_window(&mut source, &mut fallback(), 6).await;
        assert_eq!(load.source, DataSource::SyntheticFallback);
        assert_eq!(load.readings.len(), 6);
    }
}
