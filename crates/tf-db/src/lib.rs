//! Storage layer for taskflow.
//!
//! Persists projects, tasks and time intervals using `rusqlite`, and provides
//! [`SqliteTimeLog`], the local implementation of the tracker's time log.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! [`SqliteTimeLog`] puts it behind a `Mutex` so the tracker can share it.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond
//! precision (e.g., `2026-01-15T10:30:00.000Z`), so lexicographic order
//! matches chronological order. Due dates are stored as `YYYY-MM-DD`.
//!
//! At most one running interval per task is enforced by the partial unique
//! index `idx_intervals_one_running`.

mod time_log;

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use thiserror::Error;
use uuid::Uuid;

use tf_core::interval::{duration_seconds, interval_name};
use tf_core::{
    ClosedInterval, IntervalId, NewProject, NewTask, Project, ProjectId, Task, TaskId,
    TaskStatus, TimeInterval, ValidationError,
};

pub use time_log::SqliteTimeLog;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Input failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    UnknownTask(TaskId),
    /// The referenced project does not exist.
    #[error("project not found: {0}")]
    UnknownProject(ProjectId),
    /// The task already has a running interval.
    #[error("task {task_id} already has a running interval ({interval_id})")]
    AlreadyRunning {
        task_id: TaskId,
        interval_id: IntervalId,
    },
    /// The interval does not exist or was already closed.
    #[error("interval {0} is not open")]
    NotOpen(IntervalId),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {id}: {timestamp}")]
    TimestampParse {
        id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row could not be converted into a domain value.
    #[error("invalid stored data for {id}: {message}")]
    InvalidData { id: String, message: String },
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                color TEXT,
                created_at TEXT NOT NULL
            );

            -- status: kebab-case TaskStatus, priority: lowercase TaskPriority
            -- tags: JSON array of strings
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                due_date TEXT,
                time_spent_ms INTEGER NOT NULL DEFAULT 0,
                project_id TEXT,
                assigned_to TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

            CREATE TABLE IF NOT EXISTS time_intervals (
                id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL,
                name TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                running INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_intervals_task ON time_intervals(task_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_intervals_one_running
                ON time_intervals(task_id) WHERE running = 1;
            ",
        )?;
        Ok(())
    }

    // ========== Projects ==========

    /// Creates a project after validating it.
    pub fn create_project(&mut self, project: NewProject) -> Result<Project, DbError> {
        let project = project.validate()?;
        let created = Project {
            id: ProjectId::new(Uuid::new_v4().to_string())?,
            name: project.name,
            color: project.color,
            created_at: now(),
        };
        self.conn.execute(
            "INSERT INTO projects (id, name, color, created_at) VALUES (?, ?, ?, ?)",
            params![
                created.id.as_str(),
                created.name,
                created.color,
                format_timestamp(created.created_at),
            ],
        )?;
        tracing::debug!(project_id = %created.id, "project created");
        Ok(created)
    }

    /// Lists projects ordered by name.
    pub fn list_projects(&self) -> Result<Vec<Project>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, created_at FROM projects ORDER BY name ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProjectRow {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?.into_project()?);
        }
        Ok(projects)
    }

    /// Replaces a project's name and color.
    pub fn update_project(&mut self, id: &ProjectId, project: NewProject) -> Result<Project, DbError> {
        let project = project.validate()?;
        let updated = self.conn.execute(
            "UPDATE projects SET name = ?, color = ? WHERE id = ?",
            params![project.name, project.color, id.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::UnknownProject(id.clone()));
        }
        tracing::debug!(project_id = %id, "project updated");
        self.get_project(id)?
            .ok_or_else(|| DbError::UnknownProject(id.clone()))
    }

    /// Deletes a project. Its tasks are kept without a project.
    /// Returns whether a project was removed.
    pub fn delete_project(&mut self, id: &ProjectId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?", [id.as_str()])?;
        Ok(deleted > 0)
    }

    /// Fetches a project by ID.
    pub fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, color, created_at FROM projects WHERE id = ?",
                [id.as_str()],
                |row| {
                    Ok(ProjectRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        color: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        row.map(ProjectRow::into_project).transpose()
    }

    fn project_exists(&self, id: &ProjectId) -> Result<bool, DbError> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM projects WHERE id = ?", [id.as_str()], |_| {
                Ok(())
            })
            .optional()?;
        Ok(found.is_some())
    }

    // ========== Tasks ==========

    /// Inserts a task.
    ///
    /// The title and tag rules of [`NewTask::normalize`] are enforced here.
    /// The due-date rule depends on the caller's calendar, so callers run
    /// [`NewTask::validate`] with their own `today` first.
    pub fn create_task(&mut self, task: NewTask) -> Result<Task, DbError> {
        let task = task.normalize()?;
        if let Some(project_id) = &task.project_id {
            if !self.project_exists(project_id)? {
                return Err(DbError::UnknownProject(project_id.clone()));
            }
        }
        let created = Task {
            id: TaskId::new(Uuid::new_v4().to_string())?,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            time_spent_ms: 0,
            project_id: task.project_id,
            assigned_to: task.assigned_to,
            tags: task.tags,
            created_at: now(),
        };
        let tags = serde_json::to_string(&created.tags).map_err(|err| DbError::InvalidData {
            id: created.id.to_string(),
            message: err.to_string(),
        })?;
        self.conn.execute(
            "
            INSERT INTO tasks
            (id, title, description, status, priority, due_date, time_spent_ms, project_id, assigned_to, tags, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
            ",
            params![
                created.id.as_str(),
                created.title,
                created.description,
                created.status.as_str(),
                created.priority.as_str(),
                created.due_date.map(format_date),
                created.project_id.as_ref().map(ProjectId::as_str),
                created.assigned_to,
                tags,
                format_timestamp(created.created_at),
            ],
        )?;
        tracing::debug!(task_id = %created.id, "task created");
        Ok(created)
    }

    /// Fetches a task by ID.
    pub fn get_task(&self, id: &TaskId) -> Result<Option<Task>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
                [id.as_str()],
                TaskRow::from_row,
            )
            .optional()?;
        row.map(TaskRow::into_task).transpose()
    }

    /// Lists tasks ordered by creation time.
    pub fn list_tasks(&self) -> Result<Vec<Task>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], TaskRow::from_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?.into_task()?);
        }
        Ok(tasks)
    }

    /// Updates a task's status.
    pub fn update_task_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE tasks SET status = ? WHERE id = ?",
            params![status.as_str(), id.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::UnknownTask(id.clone()));
        }
        Ok(())
    }

    /// Replaces the editable fields of a task.
    ///
    /// Tracked time and creation time are kept. The same rules as
    /// [`Database::create_task`] apply.
    pub fn update_task(&mut self, id: &TaskId, task: NewTask) -> Result<Task, DbError> {
        let task = task.normalize()?;
        if let Some(project_id) = &task.project_id {
            if !self.project_exists(project_id)? {
                return Err(DbError::UnknownProject(project_id.clone()));
            }
        }
        let tags = serde_json::to_string(&task.tags).map_err(|err| DbError::InvalidData {
            id: id.to_string(),
            message: err.to_string(),
        })?;
        let updated = self.conn.execute(
            "
            UPDATE tasks
            SET title = ?, description = ?, status = ?, priority = ?, due_date = ?,
                project_id = ?, assigned_to = ?, tags = ?
            WHERE id = ?
            ",
            params![
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date.map(format_date),
                task.project_id.as_ref().map(ProjectId::as_str),
                task.assigned_to,
                tags,
                id.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(DbError::UnknownTask(id.clone()));
        }
        tracing::debug!(task_id = %id, "task updated");
        self.get_task(id)?
            .ok_or_else(|| DbError::UnknownTask(id.clone()))
    }

    /// Stores the elapsed time shown by the task's tracker.
    pub fn set_task_time_spent(&mut self, id: &TaskId, time_spent_ms: u64) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE tasks SET time_spent_ms = ? WHERE id = ?",
            params![to_sql_int(time_spent_ms), id.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::UnknownTask(id.clone()));
        }
        Ok(())
    }

    /// Deletes a task and its intervals. Returns whether a task was removed.
    pub fn delete_task(&mut self, id: &TaskId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?", [id.as_str()])?;
        Ok(deleted > 0)
    }

    // ========== Time intervals ==========

    /// Opens a running interval for a task.
    pub fn begin_interval(&mut self, task_id: &TaskId, task_label: &str) -> Result<IntervalId, DbError> {
        self.begin_interval_at(task_id, task_label, now())
    }

    fn begin_interval_at(
        &mut self,
        task_id: &TaskId,
        task_label: &str,
        now: DateTime<Utc>,
    ) -> Result<IntervalId, DbError> {
        let tx = self.conn.transaction()?;
        let task_exists = tx
            .query_row("SELECT 1 FROM tasks WHERE id = ?", [task_id.as_str()], |_| {
                Ok(())
            })
            .optional()?
            .is_some();
        if !task_exists {
            return Err(DbError::UnknownTask(task_id.clone()));
        }
        if let Some(running) = running_interval_id(&tx, task_id)? {
            return Err(DbError::AlreadyRunning {
                task_id: task_id.clone(),
                interval_id: running,
            });
        }

        let interval_id = IntervalId::new(Uuid::new_v4().to_string())?;
        tx.execute(
            "
            INSERT INTO time_intervals (id, task_id, name, started_at, ended_at, duration_seconds, running)
            VALUES (?, ?, ?, ?, NULL, 0, 1)
            ",
            params![
                interval_id.as_str(),
                task_id.as_str(),
                interval_name(task_label),
                format_timestamp(now),
            ],
        )?;
        tx.commit()?;
        tracing::debug!(%task_id, %interval_id, "interval opened");
        Ok(interval_id)
    }

    /// Closes an open interval, storing its end time and duration.
    pub fn end_interval(&mut self, interval_id: &IntervalId) -> Result<ClosedInterval, DbError> {
        self.end_interval_at(interval_id, now())
    }

    fn end_interval_at(
        &mut self,
        interval_id: &IntervalId,
        now: DateTime<Utc>,
    ) -> Result<ClosedInterval, DbError> {
        let tx = self.conn.transaction()?;
        let started_at: Option<String> = tx
            .query_row(
                "SELECT started_at FROM time_intervals WHERE id = ? AND running = 1",
                [interval_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(started_at) = started_at else {
            return Err(DbError::NotOpen(interval_id.clone()));
        };
        let started_at = parse_timestamp(&started_at, interval_id.as_str())?;
        let duration_seconds = duration_seconds(started_at, now);

        tx.execute(
            "
            UPDATE time_intervals
            SET ended_at = ?, duration_seconds = ?, running = 0
            WHERE id = ? AND running = 1
            ",
            params![
                format_timestamp(now),
                to_sql_int(duration_seconds),
                interval_id.as_str(),
            ],
        )?;
        tx.commit()?;
        tracing::debug!(%interval_id, duration_seconds, "interval closed");
        Ok(ClosedInterval {
            id: interval_id.clone(),
            ended_at: now,
            duration_seconds,
        })
    }

    /// Lists intervals, optionally for one task, ordered by start time.
    pub fn list_intervals(&self, task_id: Option<&TaskId>) -> Result<Vec<TimeInterval>, DbError> {
        let rows = match task_id {
            Some(task_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {INTERVAL_COLUMNS} FROM time_intervals WHERE task_id = ? ORDER BY started_at ASC, id ASC"
                ))?;
                let rows = stmt.query_map([task_id.as_str()], IntervalRow::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {INTERVAL_COLUMNS} FROM time_intervals ORDER BY started_at ASC, id ASC"
                ))?;
                let rows = stmt.query_map([], IntervalRow::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        rows.into_iter().map(IntervalRow::into_interval).collect()
    }

    /// Lists every interval that is still running.
    pub fn list_open_intervals(&self) -> Result<Vec<TimeInterval>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INTERVAL_COLUMNS} FROM time_intervals WHERE running = 1 ORDER BY started_at ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], IntervalRow::from_row)?;
        let mut intervals = Vec::new();
        for row in rows {
            intervals.push(row?.into_interval()?);
        }
        Ok(intervals)
    }

    /// Returns the running interval of a task, if any.
    pub fn open_interval_for(&self, task_id: &TaskId) -> Result<Option<TimeInterval>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {INTERVAL_COLUMNS} FROM time_intervals WHERE task_id = ? AND running = 1"
                ),
                [task_id.as_str()],
                IntervalRow::from_row,
            )
            .optional()?;
        row.map(IntervalRow::into_interval).transpose()
    }

    /// Sum of closed interval durations for a task, in seconds.
    pub fn task_total_seconds(&self, task_id: &TaskId) -> Result<u64, DbError> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_seconds), 0) FROM time_intervals WHERE task_id = ?",
            [task_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, time_spent_ms, project_id, assigned_to, tags, created_at";

const INTERVAL_COLUMNS: &str =
    "id, task_id, name, started_at, ended_at, duration_seconds, running";

fn running_interval_id(tx: &Transaction<'_>, task_id: &TaskId) -> Result<Option<IntervalId>, DbError> {
    let id: Option<String> = tx
        .query_row(
            "SELECT id FROM time_intervals WHERE task_id = ? AND running = 1",
            [task_id.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id.map(IntervalId::new).transpose()?)
}

#[derive(Debug)]
struct ProjectRow {
    id: String,
    name: String,
    color: Option<String>,
    created_at: String,
}

impl ProjectRow {
    fn into_project(self) -> Result<Project, DbError> {
        let created_at = parse_timestamp(&self.created_at, &self.id)?;
        Ok(Project {
            id: ProjectId::new(self.id)?,
            name: self.name,
            color: self.color,
            created_at,
        })
    }
}

#[derive(Debug)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    status: String,
    priority: String,
    due_date: Option<String>,
    time_spent_ms: i64,
    project_id: Option<String>,
    assigned_to: Option<String>,
    tags: String,
    created_at: String,
}

impl TaskRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            priority: row.get(4)?,
            due_date: row.get(5)?,
            time_spent_ms: row.get(6)?,
            project_id: row.get(7)?,
            assigned_to: row.get(8)?,
            tags: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_task(self) -> Result<Task, DbError> {
        let invalid = |message: String| DbError::InvalidData {
            id: self.id.clone(),
            message,
        };
        let due_date = self
            .due_date
            .as_deref()
            .map(|date| NaiveDate::parse_from_str(date, DATE_FORMAT))
            .transpose()
            .map_err(|err| invalid(format!("due date: {err}")))?;
        let tags: Vec<String> =
            serde_json::from_str(&self.tags).map_err(|err| invalid(format!("tags: {err}")))?;
        let created_at = parse_timestamp(&self.created_at, &self.id)?;
        Ok(Task {
            status: self.status.parse()?,
            priority: self.priority.parse()?,
            due_date,
            time_spent_ms: u64::try_from(self.time_spent_ms).unwrap_or(0),
            project_id: self.project_id.map(ProjectId::new).transpose()?,
            tags,
            created_at,
            title: self.title,
            description: self.description,
            assigned_to: self.assigned_to,
            id: TaskId::new(self.id)?,
        })
    }
}

#[derive(Debug)]
struct IntervalRow {
    id: String,
    task_id: String,
    name: String,
    started_at: String,
    ended_at: Option<String>,
    duration_seconds: i64,
    running: bool,
}

impl IntervalRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            task_id: row.get(1)?,
            name: row.get(2)?,
            started_at: row.get(3)?,
            ended_at: row.get(4)?,
            duration_seconds: row.get(5)?,
            running: row.get(6)?,
        })
    }

    fn into_interval(self) -> Result<TimeInterval, DbError> {
        let started_at = parse_timestamp(&self.started_at, &self.id)?;
        let ended_at = self
            .ended_at
            .as_deref()
            .map(|ts| parse_timestamp(ts, &self.id))
            .transpose()?;
        Ok(TimeInterval {
            task_id: TaskId::new(self.task_id)?,
            name: self.name,
            started_at,
            ended_at,
            duration_seconds: u64::try_from(self.duration_seconds).unwrap_or(0),
            running: self.running,
            id: IntervalId::new(self.id)?,
        })
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(timestamp: &str, id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

/// Current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::Duration;
    use tf_core::TaskPriority;

    fn db_with_task() -> (Database, Task) {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let task = db.create_task(NewTask::new("Write docs")).expect("create task");
        (db, task)
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "time_intervals"),
            vec![
                "id",
                "task_id",
                "name",
                "started_at",
                "ended_at",
                "duration_seconds",
                "running",
            ]
        );
        let indexes = index_names(&db.conn, "time_intervals");
        assert!(indexes.contains("idx_intervals_task"));
        assert!(indexes.contains("idx_intervals_one_running"));
        assert_eq!(table_columns(&db.conn, "projects").len(), 4);
        assert_eq!(table_columns(&db.conn, "tasks").len(), 11);
    }

    #[test]
    fn reopening_database_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("taskflow.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.create_task(NewTask::new("Persisted")).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_tasks().unwrap().len(), 1);
    }

    #[test]
    fn task_roundtrip_preserves_fields() {
        let mut db = Database::open_in_memory().unwrap();
        let project = db
            .create_project(NewProject {
                name: "Website".into(),
                color: Some("#ff0000".into()),
            })
            .unwrap();
        let mut new_task = NewTask::new("Design landing page");
        new_task.priority = TaskPriority::High;
        new_task.due_date = NaiveDate::from_ymd_opt(2030, 1, 2);
        new_task.project_id = Some(project.id.clone());
        new_task.assigned_to = Some("kim".into());
        new_task.tags = vec!["design".into()];

        let created = db.create_task(new_task).unwrap();
        let fetched = db.get_task(&created.id).unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(db.list_projects().unwrap(), vec![project]);
    }

    #[test]
    fn create_task_rejects_unknown_project() {
        let mut db = Database::open_in_memory().unwrap();
        let mut task = NewTask::new("Orphan");
        task.project_id = Some(ProjectId::new("missing").unwrap());
        assert!(matches!(db.create_task(task), Err(DbError::UnknownProject(_))));
    }

    #[test]
    fn create_task_enforces_title_rules() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.create_task(NewTask::new("ab")),
            Err(DbError::Validation(ValidationError::TitleTooShort { min: 3 }))
        ));
        let created = db.create_task(NewTask::new("  Tidy up  ")).unwrap();
        assert_eq!(created.title, "Tidy up");
        assert_eq!(db.list_tasks().unwrap().len(), 1);
    }

    #[test]
    fn update_task_replaces_editable_fields() {
        let (mut db, task) = db_with_task();
        db.set_task_time_spent(&task.id, 5_000).unwrap();
        let project = db
            .create_project(NewProject {
                name: "Docs".into(),
                color: None,
            })
            .unwrap();

        let mut edited = NewTask::new(" Write user docs ");
        edited.priority = TaskPriority::Urgent;
        edited.project_id = Some(project.id.clone());
        edited.tags = vec!["docs".into()];
        let updated = db.update_task(&task.id, edited).unwrap();

        assert_eq!(updated.title, "Write user docs");
        assert_eq!(updated.priority, TaskPriority::Urgent);
        assert_eq!(updated.project_id, Some(project.id));
        assert_eq!(updated.time_spent_ms, 5_000);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(db.get_task(&task.id).unwrap().unwrap(), updated);

        assert!(matches!(
            db.update_task(&task.id, NewTask::new("no")),
            Err(DbError::Validation(_))
        ));
        let mut orphan = NewTask::new("Orphan task");
        orphan.project_id = Some(ProjectId::new("missing").unwrap());
        assert!(matches!(
            db.update_task(&task.id, orphan),
            Err(DbError::UnknownProject(_))
        ));
        assert!(matches!(
            db.update_task(&TaskId::new("missing").unwrap(), NewTask::new("Ghost")),
            Err(DbError::UnknownTask(_))
        ));
    }

    #[test]
    fn update_and_delete_project() {
        let mut db = Database::open_in_memory().unwrap();
        let project = db
            .create_project(NewProject {
                name: "Website".into(),
                color: None,
            })
            .unwrap();
        let mut draft = NewTask::new("Landing page");
        draft.project_id = Some(project.id.clone());
        let task = db.create_task(draft).unwrap();

        let renamed = db
            .update_project(
                &project.id,
                NewProject {
                    name: " Marketing site ".into(),
                    color: Some("#00ff00".into()),
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Marketing site");
        assert_eq!(renamed.color.as_deref(), Some("#00ff00"));
        assert_eq!(renamed.created_at, project.created_at);

        assert!(db.delete_project(&project.id).unwrap());
        assert!(!db.delete_project(&project.id).unwrap());
        assert!(db.list_projects().unwrap().is_empty());
        let kept = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(kept.project_id, None);

        assert!(matches!(
            db.update_project(&project.id, NewProject {
                name: "Gone".into(),
                color: None,
            }),
            Err(DbError::UnknownProject(_))
        ));
    }

    #[test]
    fn update_status_and_time_spent() {
        let (mut db, task) = db_with_task();
        db.update_task_status(&task.id, TaskStatus::Completed).unwrap();
        db.set_task_time_spent(&task.id, 65_000).unwrap();

        let fetched = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(fetched.status, TaskStatus::Completed);
        assert_eq!(fetched.time_spent_ms, 65_000);

        let missing = TaskId::new("missing").unwrap();
        assert!(matches!(
            db.update_task_status(&missing, TaskStatus::OnHold),
            Err(DbError::UnknownTask(_))
        ));
    }

    #[test]
    fn delete_task_cascades_to_intervals() {
        let (mut db, task) = db_with_task();
        let id = db.begin_interval(&task.id, "Write docs").unwrap();
        db.end_interval(&id).unwrap();

        assert!(db.delete_task(&task.id).unwrap());
        assert!(!db.delete_task(&task.id).unwrap());
        assert!(db.list_intervals(None).unwrap().is_empty());
    }

    #[test]
    fn begin_and_end_interval() {
        let (mut db, task) = db_with_task();
        let start = Utc::now();
        let id = db.begin_interval_at(&task.id, "Write docs", start).unwrap();

        let open = db.open_interval_for(&task.id).unwrap().unwrap();
        assert_eq!(open.id, id);
        assert!(open.running);
        assert_eq!(open.name, "Time tracking: Write docs");
        assert_eq!(open.ended_at, None);

        let closed = db
            .end_interval_at(&id, start + Duration::milliseconds(90_500))
            .unwrap();
        assert_eq!(closed.duration_seconds, 90);

        assert!(db.open_interval_for(&task.id).unwrap().is_none());
        let stored = db.list_intervals(Some(&task.id)).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].running);
        assert_eq!(stored[0].duration_seconds, 90);
        assert!(stored[0].ended_at.is_some());
    }

    #[test]
    fn end_interval_clamps_clock_skew() {
        let (mut db, task) = db_with_task();
        let start = Utc::now();
        let id = db.begin_interval_at(&task.id, "Write docs", start).unwrap();
        let closed = db
            .end_interval_at(&id, start - Duration::seconds(10))
            .unwrap();
        assert_eq!(closed.duration_seconds, 0);
    }

    #[test]
    fn begin_rejects_unknown_task() {
        let mut db = Database::open_in_memory().unwrap();
        let missing = TaskId::new("missing").unwrap();
        assert!(matches!(
            db.begin_interval(&missing, "x"),
            Err(DbError::UnknownTask(_))
        ));
    }

    #[test]
    fn at_most_one_running_interval_per_task() {
        let (mut db, task) = db_with_task();
        let first = db.begin_interval(&task.id, "Write docs").unwrap();

        let err = db.begin_interval(&task.id, "Write docs").unwrap_err();
        assert!(
            matches!(err, DbError::AlreadyRunning { ref interval_id, .. } if *interval_id == first)
        );

        db.end_interval(&first).unwrap();
        assert!(db.begin_interval(&task.id, "Write docs").is_ok());
    }

    #[test]
    fn end_rejects_closed_or_unknown_interval() {
        let (mut db, task) = db_with_task();
        let id = db.begin_interval(&task.id, "Write docs").unwrap();
        db.end_interval(&id).unwrap();

        assert!(matches!(db.end_interval(&id), Err(DbError::NotOpen(_))));
        let unknown = IntervalId::new("nope").unwrap();
        assert!(matches!(db.end_interval(&unknown), Err(DbError::NotOpen(_))));
    }

    #[test]
    fn total_seconds_sums_closed_intervals() {
        let (mut db, task) = db_with_task();
        let start = Utc::now();
        let first = db.begin_interval_at(&task.id, "a", start).unwrap();
        db.end_interval_at(&first, start + Duration::seconds(30)).unwrap();
        let second = db
            .begin_interval_at(&task.id, "a", start + Duration::seconds(60))
            .unwrap();
        db.end_interval_at(&second, start + Duration::seconds(105)).unwrap();
        db.begin_interval_at(&task.id, "a", start + Duration::seconds(200))
            .unwrap();

        assert_eq!(db.task_total_seconds(&task.id).unwrap(), 75);
        assert_eq!(db.list_open_intervals().unwrap().len(), 1);
    }
}
