//! Output formatting and persistence for class reports.
//!
//! Supports pretty-printing, JSON serialization, and CSV export.

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

use crate::analyzers::types::{ClassReport, ObjectiveReport};
use csv::WriterBuilder;

/// Logs a class report using Rust's debug pretty-print format.
pub fn print_pretty(report: &ClassReport) {
    debug!("{:#?}", report);
}

/// Renders a class report as pretty-printed JSON.
pub fn render_json(report: &ClassReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Prints a class report as JSON on stdout, so it can be piped.
pub fn print_json(report: &ClassReport) -> Result<()> {
    println!("{}", render_json(report)?);
    Ok(())
}

/// One CSV line of an exported report.
#[derive(Debug, Serialize)]
struct ObjectiveLine<'a> {
    objective: &'a str,
    mastered: usize,
    partial: usize,
    not_mastered: usize,
    recorded: usize,
    total_students: usize,
}

impl<'a> From<&'a ObjectiveReport> for ObjectiveLine<'a> {
    fn from(report: &'a ObjectiveReport) -> Self {
        Self {
            objective: &report.objective,
            mastered: report.mastered_count,
            partial: report.partial_count,
            not_mastered: report.not_mastered_count,
            recorded: report.recorded(),
            total_students: report.total_students,
        }
    }
}

/// Renders the per-objective tier counts of `report` as CSV.
pub fn report_csv(report: &ClassReport) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for objective in &report.objectives {
        writer.serialize(ObjectiveLine::from(objective))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}

/// Writes the CSV export of `report` to `path`, gzip-compressed if asked.
pub fn write_report(path: &str, report: &ClassReport, gzip: bool) -> Result<()> {
    let csv = report_csv(report)?;

    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&csv)?;
        encoder.finish()?
    } else {
        csv
    };

    debug!(path, gzip, bytes = body.len(), "Writing report");
    std::fs::write(path, body)?;
    Ok(())
}
