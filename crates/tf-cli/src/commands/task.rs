//! Task commands.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use tf_core::{
    NewTask, Task, TaskFilter, TaskId, TaskStatus, TaskUpdate, TimeInterval, format_elapsed,
};
use tf_db::Database;

use crate::TaskAddArgs;

/// Validates and stores a new task.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    args: TaskAddArgs,
    today: NaiveDate,
) -> Result<Task> {
    let draft = NewTask {
        title: args.title,
        description: args.description,
        status: args.status,
        priority: args.priority,
        due_date: args.due,
        project_id: args.project,
        assigned_to: args.assignee.filter(|a| !a.trim().is_empty()),
        tags: args.tags,
    }
    .validate(today)?;
    let task = db.create_task(draft)?;
    writeln!(writer, "Created task {} ({})", task.title, task.id)?;
    Ok(task)
}

pub fn list<W: Write>(
    writer: &mut W,
    db: &Database,
    filter: &TaskFilter,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let tasks = db.list_tasks()?;
    let matching = filter.apply(&tasks, today);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&matching)?)?;
    } else {
        write!(writer, "{}", format_tasks(&matching))?;
    }
    Ok(())
}

/// Task details with its recorded intervals.
#[derive(Debug, Serialize)]
struct TaskDetails<'a> {
    #[serde(flatten)]
    task: &'a Task,
    intervals: &'a [TimeInterval],
}

pub fn show<W: Write>(writer: &mut W, db: &Database, id: &TaskId, json: bool) -> Result<()> {
    let task = db
        .get_task(id)?
        .ok_or_else(|| anyhow!("task not found: {id}"))?;
    let intervals = db.list_intervals(Some(id))?;
    if json {
        let details = TaskDetails {
            task: &task,
            intervals: &intervals,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&details)?)?;
    } else {
        write!(writer, "{}", format_task(&task, &intervals))?;
    }
    Ok(())
}

/// Applies field changes to a stored task, re-running the form rules.
pub fn edit<W: Write>(
    writer: &mut W,
    db: &mut Database,
    id: &TaskId,
    update: TaskUpdate,
    today: NaiveDate,
) -> Result<Task> {
    let current = db
        .get_task(id)?
        .ok_or_else(|| anyhow!("task not found: {id}"))?;
    if update.is_empty() {
        writeln!(writer, "Nothing to change for task {id}")?;
        return Ok(current);
    }
    let draft = update.apply(&current, today)?;
    let task = db.update_task(id, draft)?;
    writeln!(writer, "Updated task {} ({})", task.title, task.id)?;
    Ok(task)
}

pub fn set_status<W: Write>(
    writer: &mut W,
    db: &mut Database,
    id: &TaskId,
    status: TaskStatus,
) -> Result<()> {
    db.update_task_status(id, status)?;
    writeln!(writer, "Task {id} is now {status}")?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, db: &mut Database, id: &TaskId) -> Result<()> {
    if !db.delete_task(id)? {
        return Err(anyhow!("task not found: {id}"));
    }
    writeln!(writer, "Deleted task {id}")?;
    Ok(())
}

/// Formats tasks as an aligned table.
pub fn format_tasks(tasks: &[&Task]) -> String {
    let mut output = String::new();
    if tasks.is_empty() {
        output.push_str("No tasks match.\n");
        return output;
    }
    let _ = writeln!(
        output,
        "{:<36}  {:<24}  {:<11}  {:<8}  {:<10}  {:>8}",
        "ID", "Title", "Status", "Priority", "Due", "Time"
    );
    for task in tasks {
        let due = task
            .due_date
            .map_or_else(|| "-".to_string(), |due| due.to_string());
        let _ = writeln!(
            output,
            "{:<36}  {:<24}  {:<11}  {:<8}  {:<10}  {:>8}",
            task.id,
            truncate(&task.title, 24),
            task.status,
            task.priority,
            due,
            format_elapsed(task.time_spent_ms),
        );
    }
    output
}

/// Formats a single task with its intervals.
pub fn format_task(task: &Task, intervals: &[TimeInterval]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{} ({})", task.title, task.id);
    if !task.description.is_empty() {
        let _ = writeln!(output, "  {}", task.description);
    }
    let _ = writeln!(output, "Status:    {}", task.status);
    let _ = writeln!(output, "Priority:  {}", task.priority);
    if let Some(due) = task.due_date {
        let _ = writeln!(output, "Due:       {due}");
    }
    if let Some(project) = &task.project_id {
        let _ = writeln!(output, "Project:   {project}");
    }
    if let Some(assignee) = &task.assigned_to {
        let _ = writeln!(output, "Assignee:  {assignee}");
    }
    if !task.tags.is_empty() {
        let _ = writeln!(output, "Tags:      {}", task.tags.join(", "));
    }
    let _ = writeln!(output, "Time:      {}", format_elapsed(task.time_spent_ms));

    if intervals.is_empty() {
        return output;
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Intervals:");
    for interval in intervals {
        let ended = interval.ended_at.map_or_else(
            || "running".to_string(),
            |ended| ended.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        let _ = writeln!(
            output,
            "  {}  ->  {}  {}",
            interval.started_at.format("%Y-%m-%d %H:%M:%S"),
            ended,
            format_elapsed(interval.duration_seconds.saturating_mul(1000)),
        );
    }
    output
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}
