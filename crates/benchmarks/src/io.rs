//! I/O operations for batch results.
//!
//! This module writes batch rows as CSV, unit spans and trial records as
//! JSON, and the Markdown summary.

use crate::markdown;
use crate::result::{BatchReport, RunRow};
use rbperf_core::record::TABLE_COLUMNS;
use rbperf_core::{ResultRecord, UnitSpan};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default output directory path.
pub const OUTPUT_DIR: &str = "benchmarks/output";

/// CSV file with every aggregated row.
pub const ROWS_FILE: &str = "batch.csv";

/// JSON file with the full batch report.
pub const REPORT_FILE: &str = "batch.json";

/// Markdown summary file.
pub const SUMMARY_FILE: &str = "summary.md";

/// Unit spans of a batch that was aborted.
pub const UNITS_FILE: &str = "units.json";

/// Paths written by [`write_all_outputs`].
#[derive(Debug, Clone)]
pub struct OutputPaths {
    /// CSV rows.
    pub rows: PathBuf,
    /// JSON report.
    pub report: PathBuf,
    /// Markdown summary.
    pub summary: PathBuf,
}

/// Ensure the output directory exists.
pub fn ensure_output_dir(dir: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV header line for batch rows.
pub fn csv_header() -> String {
    let mut columns = vec!["timestamp", "run_id"];
    columns.extend(TABLE_COLUMNS);
    columns.join(",")
}

/// One CSV line: capture timestamp, unit index, then the scraped cells.
pub fn csv_line(row: &RunRow) -> String {
    let mut fields = vec![row.captured_at.to_rfc3339(), row.unit_id.to_string()];
    fields.extend(row.cells.iter().map(|c| csv_field(c)));
    fields.join(",")
}

/// Render rows as CSV with a header.
pub fn rows_to_csv(rows: &[RunRow]) -> String {
    let mut out = csv_header();
    out.push('\n');
    for row in rows {
        out.push_str(&csv_line(row));
        out.push('\n');
    }
    out
}

/// Write rows to a CSV file.
pub fn write_rows_csv(rows: &[RunRow], path: impl AsRef<Path>) -> io::Result<()> {
    fs::write(path, rows_to_csv(rows))
}

/// Write a batch report to a JSON file.
pub fn write_report_json(report: &BatchReport, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Write trial records as a JSON array.
pub fn write_records_json(records: &[ResultRecord], path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Write unit spans as a JSON array.
pub fn write_units_json(units: &[UnitSpan], path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(units)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

/// Write every batch output (CSV, JSON, summary) into `dir`.
pub fn write_all_outputs(report: &BatchReport, dir: impl AsRef<Path>) -> io::Result<OutputPaths> {
    let dir = dir.as_ref();
    ensure_output_dir(dir)?;

    let paths = OutputPaths {
        rows: dir.join(ROWS_FILE),
        report: dir.join(REPORT_FILE),
        summary: dir.join(SUMMARY_FILE),
    };

    write_rows_csv(&report.rows, &paths.rows)?;
    write_report_json(report, &paths.report)?;
    fs::write(&paths.summary, markdown::generate_summary(report))?;

    Ok(paths)
}

/// Read a batch report back from JSON.
pub fn read_report_json(path: impl AsRef<Path>) -> io::Result<BatchReport> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(unit: usize, cells: &[&str]) -> RunRow {
        RunRow {
            unit_id: unit,
            captured_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_csv_header() {
        assert_eq!(
            csv_header(),
            "timestamp,run_id,bucket_region,bucket_region_name,file_size,mib_s,browser,server,server_client,server_hop,browser_boost_percent"
        );
    }

    #[test]
    fn test_csv_line_prefixes_timestamp() {
        let line = csv_line(&row(2, &["gcsrbpa-us-west1", "Oregon", "2mib.txt"]));
        assert_eq!(
            line,
            "2025-03-01T12:00:00+00:00,2,gcsrbpa-us-west1,Oregon,2mib.txt"
        );
    }

    #[test]
    fn test_csv_quotes_fields() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn test_write_records_json_is_array() {
        use rbperf_core::{Decomposition, TimingTriple, TrialRequest};

        let request = TrialRequest::parse("2mib.txt", "us-west1").unwrap();
        let d = Decomposition::compute(&TimingTriple::failed(), 2_097_152, 2);
        let record = ResultRecord::assemble(&request, &d);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trial.json");
        write_records_json(&[record.clone()], &path).unwrap();

        let read: Vec<ResultRecord> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, vec![record]);
    }

    #[test]
    fn test_rows_to_csv_keeps_order() {
        let csv = rows_to_csv(&[row(0, &["b"]), row(0, &["a"]), row(1, &["c"])]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with(",0,b"));
        assert!(lines[2].ends_with(",0,a"));
        assert!(lines[3].ends_with(",1,c"));
    }
}
