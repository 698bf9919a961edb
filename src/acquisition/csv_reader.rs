//! Reading data ingestion from CSV datasets
//!
//! Expected CSV format (header required, column order free, extra columns ignored):
//! timestamp,rain_mm_per_hr,drain_flow_Lps,tank_fill_pct

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

use crate::types::Reading;

pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_RAIN: &str = "rain_mm_per_hr";
pub const COL_FLOW: &str = "drain_flow_Lps";
pub const COL_TANK: &str = "tank_fill_pct";

/// Columns every dataset must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_TIMESTAMP, COL_RAIN, COL_FLOW, COL_TANK];

/// Malformed or unreadable external dataset.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("Cannot read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset contains no data rows")]
    Empty,

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Line {line}: expected {expected} fields, got {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: cannot parse timestamp '{value}'")]
    Timestamp { line: usize, value: String },

    #[error("Line {line}: cannot parse {column} as a number: '{value}'")]
    Number {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("Line {line}: {column} = {value} is outside {allowed}")]
    OutOfRange {
        line: usize,
        column: &'static str,
        value: f64,
        allowed: &'static str,
    },
}

/// Column positions resolved from the header line.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    timestamp: usize,
    rain: usize,
    flow: usize,
    tank: usize,
    width: usize,
}

impl ColumnIndex {
    fn from_header(header: &str) -> Result<Self, DataFormatError> {
        let names: Vec<&str> = header.split(',').map(|h| h.trim().trim_matches('"')).collect();
        let find = |column: &str| {
            names
                .iter()
                .position(|n| *n == column)
                .ok_or_else(|| DataFormatError::MissingColumn(column.to_string()))
        };
        let timestamp = find(COL_TIMESTAMP)?;
        let rain = find(COL_RAIN)?;
        let flow = find(COL_FLOW)?;
        let tank = find(COL_TANK)?;
        Ok(Self {
            timestamp,
            rain,
            flow,
            tank,
            width: timestamp.max(rain).max(flow).max(tank) + 1,
        })
    }
}

/// Read and parse a CSV dataset from disk.
pub fn read_csv_file(path: &Path) -> Result<Vec<Reading>, DataFormatError> {
    let contents = std::fs::read_to_string(path).map_err(|e| DataFormatError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let readings = parse_csv(&contents)?;
    tracing::info!(count = readings.len(), path = %path.display(), "Loaded readings from CSV");
    Ok(readings)
}

/// Parse CSV text into readings sorted ascending by timestamp.
///
/// Any malformed row fails the whole dataset. Rows sharing a timestamp keep
/// the last one, so the result is strictly increasing.
pub fn parse_csv(contents: &str) -> Result<Vec<Reading>, DataFormatError> {
    let mut lines = contents
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_start_matches('\u{feff}')))
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or(DataFormatError::Empty)?;
    let columns = ColumnIndex::from_header(header)?;

    let mut by_time: BTreeMap<DateTime<Utc>, Reading> = BTreeMap::new();
    for (line_num, line) in lines {
        let reading = parse_row(line, line_num, columns)?;
        by_time.insert(reading.timestamp, reading);
    }

    if by_time.is_empty() {
        return Err(DataFormatError::Empty);
    }
    Ok(by_time.into_values().collect())
}

fn parse_row(line: &str, line_num: usize, columns: ColumnIndex) -> Result<Reading, DataFormatError> {
    let fields: Vec<&str> = line.split(',').map(|f| f.trim().trim_matches('"')).collect();
    if fields.len() < columns.width {
        return Err(DataFormatError::FieldCount {
            line: line_num,
            expected: columns.width,
            found: fields.len(),
        });
    }

    let timestamp = parse_timestamp(fields[columns.timestamp]).ok_or_else(|| {
        DataFormatError::Timestamp {
            line: line_num,
            value: fields[columns.timestamp].to_string(),
        }
    })?;

    let rain = parse_f64(fields[columns.rain], COL_RAIN, line_num)?;
    let flow = parse_f64(fields[columns.flow], COL_FLOW, line_num)?;
    let tank = parse_f64(fields[columns.tank], COL_TANK, line_num)?;

    check_range(rain, COL_RAIN, line_num, 0.0, f64::MAX, ">= 0")?;
    check_range(flow, COL_FLOW, line_num, 0.0, f64::MAX, ">= 0")?;
    check_range(tank, COL_TANK, line_num, 0.0, 100.0, "0-100")?;

    Ok(Reading::new(timestamp, rain, flow, tank))
}

/// Shortest digit string taken as unix epoch seconds (2001-09-09 onward).
///
/// Shorter all-digit values are ISO-8601 basic dates (`20260301`), not epochs.
pub const MIN_EPOCH_DIGITS: usize = 10;

/// Parse a timestamp: RFC 3339, naive ISO-8601 date-time (taken as UTC) in
/// extended or basic form, a bare date, or unix epoch seconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 8] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y%m%dT%H%M%S",
        "%Y%m%dT%H%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y%m%d"] {
        if let Some(naive) = NaiveDate::parse_from_str(s, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Some(naive.and_utc());
        }
    }

    if s.len() >= MIN_EPOCH_DIGITS && s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single());
    }

    None
}

fn parse_f64(s: &str, column: &'static str, line: usize) -> Result<f64, DataFormatError> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataFormatError::Number {
            line,
            column,
            value: s.to_string(),
        })
}

fn check_range(
    value: f64,
    column: &'static str,
    line: usize,
    min: f64,
    max: f64,
    allowed: &'static str,
) -> Result<(), DataFormatError> {
    if value < min || value > max {
        return Err(DataFormatError::OutOfRange {
            line,
            column,
            value,
            allowed,
        });
    }
    Ok(())
}

/// Keep only the most recent `window` readings.
pub fn truncate_to_window(mut readings: Vec<Reading>, window: usize) -> Vec<Reading> {
    if readings.len() > window {
        readings.drain(..readings.len() - window);
    }
    readings
}
