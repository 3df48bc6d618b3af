//! Contract for the external store that records interval boundaries.

use std::future::Future;

use thiserror::Error;

use crate::interval::ClosedInterval;
use crate::types::{IntervalId, TaskId, ValidationError};

/// Errors returned by a [`TimeLog`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeLogError {
    /// The request was malformed and will not succeed on retry.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The task does not exist in the store.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
    /// The task already has a running interval.
    #[error("task {task_id} already has a running interval ({interval_id})")]
    AlreadyRunning {
        task_id: TaskId,
        interval_id: IntervalId,
    },
    /// The interval does not exist or was already closed.
    #[error("interval {0} is not open")]
    NotOpen(IntervalId),
    /// The store could not be reached or failed to process the request.
    #[error("time log unavailable: {0}")]
    Unavailable(String),
}

impl TimeLogError {
    /// Whether the failure came from the transport rather than the request.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// The store that durably records when tracking sessions begin and end.
///
/// Only session boundaries reach the store; ticks are never persisted.
pub trait TimeLog: Send + Sync {
    /// Opens a running interval for `task_id` and returns its identifier.
    fn begin_interval(
        &self,
        task_id: &TaskId,
        task_label: &str,
    ) -> impl Future<Output = Result<IntervalId, TimeLogError>> + Send;

    /// Closes an open interval, computing its duration from wall-clock time.
    fn end_interval(
        &self,
        interval_id: &IntervalId,
    ) -> impl Future<Output = Result<ClosedInterval, TimeLogError>> + Send;
}
