//! Status command for showing the database and intervals left running.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tf_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    db_path: &Path,
    now: DateTime<Utc>,
) -> Result<()> {
    let tasks = db.list_tasks()?;
    let open = db.list_open_intervals()?;

    writeln!(writer, "Taskflow status")?;
    writeln!(writer, "Database: {}", db_path.display())?;
    writeln!(writer, "Tasks: {}", tasks.len())?;

    if open.is_empty() {
        writeln!(writer, "No running intervals.")?;
        return Ok(());
    }

    writeln!(writer, "Running intervals:")?;
    for interval in open {
        let running_for = tf_core::interval::duration_seconds(interval.started_at, now);
        writeln!(
            writer,
            "- {} ({}) since {}, {}",
            interval.name,
            interval.id,
            interval.started_at.format("%Y-%m-%d %H:%M:%S"),
            tf_core::format_elapsed(running_for.saturating_mul(1000)),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use tf_core::NewTask;

    #[test]
    fn status_without_running_intervals() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("tf.db");
        let mut db = Database::open(&db_path).unwrap();
        db.create_task(NewTask::new("Write docs")).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path, Utc::now()).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/tf.db");
        assert_snapshot!(output, @r"
        Taskflow status
        Database: [TEMP]/tf.db
        Tasks: 1
        No running intervals.
        ");
    }

    #[test]
    fn status_lists_running_intervals() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.create_task(NewTask::new("Write docs")).unwrap();
        let id = db.begin_interval(&task.id, "Write docs").unwrap();
        let started = db.open_interval_for(&task.id).unwrap().unwrap().started_at;

        let mut output = Vec::new();
        run(
            &mut output,
            &db,
            Path::new(":memory:"),
            started + chrono::Duration::seconds(65),
        )
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output
            .replace(&id.to_string(), "[ID]")
            .replace(&started.format("%Y-%m-%d %H:%M:%S").to_string(), "[START]");
        assert_snapshot!(output, @r"
        Taskflow status
        Database: :memory:
        Tasks: 1
        Running intervals:
        - Time tracking: Write docs ([ID]) since [START], 00:01:05
        ");
    }
}
