//! Interval inspection and manual close.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use tf_core::{IntervalId, TaskId, TimeInterval, format_elapsed};
use tf_db::Database;

pub fn list<W: Write>(
    writer: &mut W,
    db: &Database,
    task_id: Option<&TaskId>,
    json: bool,
) -> Result<()> {
    let intervals = db.list_intervals(task_id)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&intervals)?)?;
    } else {
        write!(writer, "{}", format_intervals(&intervals))?;
    }
    Ok(())
}

/// Closes an interval that a tracker failed to close.
pub fn close<W: Write>(writer: &mut W, db: &mut Database, id: &IntervalId) -> Result<()> {
    let closed = db.end_interval(id)?;
    tracing::info!(
        interval_id = %closed.id,
        duration_seconds = closed.duration_seconds,
        "interval closed manually"
    );
    writeln!(
        writer,
        "Closed interval {} after {}",
        closed.id,
        format_elapsed(closed.duration_seconds.saturating_mul(1000))
    )?;
    Ok(())
}

pub fn format_intervals(intervals: &[TimeInterval]) -> String {
    let mut output = String::new();
    if intervals.is_empty() {
        output.push_str("No intervals recorded.\n");
        return output;
    }
    let _ = writeln!(
        output,
        "{:<36}  {:<36}  {:<19}  {:<19}  {:>8}",
        "ID", "Task", "Started", "Ended", "Duration"
    );
    for interval in intervals {
        let ended = interval.ended_at.map_or_else(
            || "running".to_string(),
            |ended| ended.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        let _ = writeln!(
            output,
            "{:<36}  {:<36}  {:<19}  {:<19}  {:>8}",
            interval.id,
            interval.task_id,
            interval.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ended,
            format_elapsed(interval.duration_seconds.saturating_mul(1000)),
        );
    }
    output
}
