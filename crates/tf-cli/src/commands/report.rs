//! Report command for task analytics.
//!
//! This module implements `tf report`, which aggregates the filtered task
//! list into status and priority counts plus tracked time per project.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use tf_core::{Report, TaskFilter};
use tf_db::Database;

/// Format minutes as a human-readable duration (e.g., "2h 30m").
pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let minutes = minutes % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Builds the report for tasks passing `filter`.
pub fn build(db: &Database, filter: &TaskFilter, today: NaiveDate) -> Result<Report> {
    let tasks = db.list_tasks()?;
    let projects = db.list_projects()?;
    let matching = filter.apply(&tasks, today);
    Ok(Report::build(matching, &projects))
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    filter: &TaskFilter,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let report = build(db, filter, today)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }
    Ok(())
}

/// Format a report for human-readable output.
pub fn format_report(report: &Report) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "TASK REPORT");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Tasks: {}  Completed: {}%",
        report.total_tasks, report.completion_percent
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "BY STATUS");
    for entry in &report.by_status {
        let _ = writeln!(output, "  {:<12} {:>4}", entry.status, entry.count);
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "BY PRIORITY");
    for entry in &report.by_priority {
        let _ = writeln!(output, "  {:<12} {:>4}", entry.priority, entry.count);
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "TIME BY PROJECT");
    for entry in &report.time_by_project {
        let _ = writeln!(
            output,
            "  {:<20} {:>8}",
            entry.name,
            format_minutes(entry.minutes)
        );
    }
    let _ = writeln!(
        output,
        "  {:<20} {:>8}",
        "(no project)",
        format_minutes(report.unassigned_minutes)
    );

    output
}
