//! SQLite-backed [`TimeLog`].

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tf_core::{ClosedInterval, IntervalId, TaskId, TimeLog, TimeLogError};

use crate::{Database, DbError};

/// Time log that records interval boundaries in the local database.
pub struct SqliteTimeLog {
    db: Mutex<Database>,
}

impl SqliteTimeLog {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Locks the database for direct queries.
    pub fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimeLog for SqliteTimeLog {
    fn begin_interval(
        &self,
        task_id: &TaskId,
        task_label: &str,
    ) -> impl Future<Output = Result<IntervalId, TimeLogError>> + Send {
        async move {
            self.db()
                .begin_interval(task_id, task_label)
                .map_err(TimeLogError::from)
        }
    }

    fn end_interval(
        &self,
        interval_id: &IntervalId,
    ) -> impl Future<Output = Result<ClosedInterval, TimeLogError>> + Send {
        async move {
            self.db()
                .end_interval(interval_id)
                .map_err(TimeLogError::from)
        }
    }
}

impl From<DbError> for TimeLogError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(err) => Self::Validation(err),
            DbError::UnknownTask(task_id) => Self::UnknownTask(task_id),
            DbError::AlreadyRunning {
                task_id,
                interval_id,
            } => Self::AlreadyRunning {
                task_id,
                interval_id,
            },
            DbError::NotOpen(interval_id) => Self::NotOpen(interval_id),
            other => Self::Unavailable(other.to_string()),
        }
    }
}
