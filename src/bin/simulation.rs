//! Drainage Sensor Simulation
//!
//! Generates synthetic rain / drain-flow / tank-fill readings in the CSV
//! layout the monitor ingests, or as JSON lines. With `--score` each row is
//! also run through the risk model and alert rules, replaying the series one
//! reading per tick.
//!
//! # Usage
//! ```bash
//! ./simulation --hours 48 --seed 7 > feed.csv
//! ./drainage-monitor --csv feed.csv
//!
//! ./simulation --hours 24 --format json --score --quiet
//! ```

use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use drainage_monitor::acquisition::synthetic::align_to_step;
use drainage_monitor::acquisition::{SyntheticConfig, SyntheticGenerator};
use drainage_monitor::types::{DataSource, DesignParameters, Reading, Severity};
use drainage_monitor::{MonitorConfig, PipelineDriver};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "drainage-simulation")]
#[command(about = "Synthetic drainage sensor data for the flood-risk monitor")]
#[command(version)]
struct Args {
    /// Number of hourly readings to generate (1-8760)
    #[arg(short = 'H', long, default_value = "24", value_parser = clap::value_parser!(u32).range(1..=8760))]
    hours: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the injected demo rain spike
    #[arg(long)]
    no_spike: bool,

    /// Append risk score and severity computed with default design parameters
    #[arg(long)]
    score: bool,

    /// Suppress the summary on stderr
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================================
// Output
// ============================================================================

/// One output row. Score fields are omitted unless `--score` is given.
#[derive(Debug, Serialize)]
struct Row {
    #[serde(flatten)]
    reading: Reading,
    #[serde(skip_serializing_if = "Option::is_none")]
    risk: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
}

fn write_csv_header(out: &mut impl Write, score: bool) -> io::Result<()> {
    write!(out, "timestamp,rain_mm_per_hr,drain_flow_Lps,tank_fill_pct")?;
    if score {
        write!(out, ",risk,severity")?;
    }
    writeln!(out)
}

fn write_csv_row(out: &mut impl Write, row: &Row) -> io::Result<()> {
    let r = &row.reading;
    write!(
        out,
        "{},{:.2},{:.2},{:.1}",
        r.timestamp.format("%Y-%m-%d %H:%M:%S"),
        r.rain_rate,
        r.flow_rate,
        r.tank_fill
    )?;
    if let (Some(risk), Some(severity)) = (row.risk, row.severity) {
        write!(out, ",{risk},{severity}")?;
    }
    writeln!(out)
}

/// Score each reading as if it arrived on its own tick.
fn score_series(readings: &[Reading], params: &DesignParameters) -> Vec<(u8, Severity)> {
    let mut driver = PipelineDriver::new(MonitorConfig::default().window_size());
    readings
        .iter()
        .filter_map(|r| {
            driver.push(*r);
            driver
                .tick(params, DataSource::Synthetic, None)
                .map(|s| (s.breakdown.risk, s.severity))
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = SyntheticConfig {
        step: Duration::hours(1),
        demo_spike: !args.no_spike,
        seed: args.seed,
    };
    let end = align_to_step(Utc::now(), config.step);
    let mut generator = SyntheticGenerator::new(config);
    let readings = generator.generate_ending_at(args.hours as usize, end);

    let scores: Vec<Option<(u8, Severity)>> = if args.score {
        score_series(&readings, &DesignParameters::default())
            .into_iter()
            .map(Some)
            .collect()
    } else {
        vec![None; readings.len()]
    };

    let rows: Vec<Row> = readings
        .iter()
        .zip(scores)
        .map(|(reading, score)| Row {
            reading: *reading,
            risk: score.map(|(risk, _)| risk),
            severity: score.map(|(_, severity)| severity),
        })
        .collect();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match args.format {
        OutputFormat::Csv => {
            write_csv_header(&mut out, args.score).context("Failed to write CSV header")?;
            for row in &rows {
                write_csv_row(&mut out, row).context("Failed to write CSV row")?;
            }
        }
        OutputFormat::Json => {
            for row in &rows {
                serde_json::to_writer(&mut out, row).context("Failed to serialize row")?;
                writeln!(out).context("Failed to write row")?;
            }
        }
    }
    out.flush().context("Failed to flush output")?;

    if !args.quiet {
        let peak_rain = readings.iter().map(|r| r.rain_rate).fold(0.0, f64::max);
        let peak_tank = readings.iter().map(|r| r.tank_fill).fold(0.0, f64::max);
        eprintln!(
            "Generated {} readings ({} to {}), peak rain {:.2} mm/hr, peak tank {:.1}%",
            rows.len(),
            readings.first().map(|r| r.timestamp.to_rfc3339()).unwrap_or_default(),
            readings.last().map(|r| r.timestamp.to_rfc3339()).unwrap_or_default(),
            peak_rain,
            peak_tank,
        );
        if let Some(peak_risk) = rows.iter().filter_map(|r| r.risk).max() {
            let critical = rows
                .iter()
                .filter(|r| r.severity == Some(Severity::Critical))
                .count();
            eprintln!("Peak risk {peak_risk}/100, {critical} critical tick(s)");
        }
    }

    Ok(())
}
