//! Markdown output generation for batch results.

use crate::result::BatchReport;
use rbperf_core::record::TABLE_COLUMNS;
use std::fmt::Write;

/// Generate a markdown summary of a batch.
pub fn generate_summary(report: &BatchReport) -> String {
    let mut output = String::new();

    // Writing into a String cannot fail.
    let _ = write_summary(&mut output, report);
    output
}

fn write_summary(output: &mut String, report: &BatchReport) -> std::fmt::Result {
    writeln!(output, "# Batch Summary")?;
    writeln!(output)?;
    writeln!(output, "Run: `{}`", report.run_id)?;
    writeln!(output, "Started: {}", report.started_at.to_rfc3339())?;
    writeln!(output, "Finished: {}", report.finished_at.to_rfc3339())?;
    writeln!(output, "Policy: {:?}", report.policy)?;
    writeln!(output)?;

    writeln!(output, "## Units")?;
    writeln!(output)?;
    writeln!(output, "| Unit | Status | Duration (ms) | Rows | Error |")?;
    writeln!(output, "|------|--------|---------------|------|-------|")?;
    for unit in &report.units {
        writeln!(
            output,
            "| {} | {:?} | {} | {} | {} |",
            unit.unit_id,
            unit.status,
            unit.duration_ms.map(|d| d.to_string()).unwrap_or_default(),
            unit.rows_scraped,
            unit.error_message.as_deref().unwrap_or("")
        )?;
    }
    writeln!(output)?;

    writeln!(output, "## Rows")?;
    writeln!(output)?;
    writeln!(output, "| captured_at | run_id | {} |", TABLE_COLUMNS.join(" | "))?;
    writeln!(output, "|{}", "---|".repeat(TABLE_COLUMNS.len() + 2))?;
    for row in &report.rows {
        writeln!(
            output,
            "| {} | {} | {} |",
            row.captured_at.format("%Y-%m-%d %H:%M:%S%.3f UTC"),
            row.unit_id,
            row.cells.join(" | ")
        )?;
    }

    writeln!(output)?;
    writeln!(output, "---")?;
    writeln!(
        output,
        "Units completed: {}/{}, rows: {}",
        report.completed_units(),
        report.units.len(),
        report.rows.len()
    )?;
    Ok(())
}
