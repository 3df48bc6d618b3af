//! Track command: runs a [`TimeTracker`] for one task until told to stop.
//!
//! The tracker persists the session as a time interval. Once the interval
//! is closed, the displayed elapsed time is written back to the task.

use std::future::Future;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use tf_core::interval::duration_seconds;
use tf_core::{
    ClosedInterval, Notice, Outcome, TaskId, TimeTracker, TrackerConfig, TrackerObserver,
    format_elapsed,
};
use tf_db::{Database, SqliteTimeLog};

/// Prints ticks and notices as lines.
pub struct ConsoleObserver<W> {
    out: Mutex<W>,
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn line(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            tracing::debug!(%err, "failed to write tracker output");
        }
    }
}

impl<W: Write + Send + 'static> TrackerObserver for ConsoleObserver<W> {
    fn on_elapsed_change(&self, elapsed_ms: u64) {
        self.line(&format_elapsed(elapsed_ms));
    }

    fn notify(&self, notice: Notice) {
        let text = match notice {
            Notice::Started {
                interval_id: Some(id),
            } => format!("Tracking started (interval {id})"),
            Notice::Started { interval_id: None } => "Tracking started".to_string(),
            Notice::Stopped {
                duration_seconds: Some(seconds),
                ..
            } => format!(
                "Tracking stopped, {} recorded",
                format_elapsed(seconds.saturating_mul(1000))
            ),
            Notice::Stopped {
                duration_seconds: None,
                ..
            } => "Tracking stopped".to_string(),
            Notice::StartFailed { error } => format!("Could not start tracking: {error}"),
            Notice::StopFailed { interval_id, error } => format!(
                "Could not stop tracking: {error}. Close it later with `tf intervals close {interval_id}`"
            ),
        };
        self.line(&text);
    }
}

/// Result of a tracking session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Elapsed time saved on the task.
    pub elapsed_ms: u64,
    /// Interval closed by this session.
    pub closed: Option<ClosedInterval>,
    /// Whether the session continued an interval left open earlier.
    pub resumed: bool,
}

/// Tracks `task_id` until `until` completes.
///
/// An interval left running by an earlier session is resumed rather than
/// duplicated, and its time so far is added to the starting display.
///
/// The task's saved time only ever covers closed intervals: it is written
/// back when the stop succeeds and left untouched when the interval stays
/// open, so a later resume does not count the open interval twice.
pub async fn run<W, F>(
    out: W,
    db: Database,
    task_id: &TaskId,
    tick_period: Duration,
    until: F,
) -> Result<Session>
where
    W: Write + Send + 'static,
    F: Future<Output = ()>,
{
    let task = db
        .get_task(task_id)?
        .ok_or_else(|| anyhow!("task not found: {task_id}"))?;
    let open = db.open_interval_for(task_id)?;

    let resumed_ms = open.as_ref().map_or(0, |interval| {
        duration_seconds(interval.started_at, Utc::now()).saturating_mul(1000)
    });
    let config = TrackerConfig {
        task_id: Some(task.id.clone()),
        task_label: task.label().to_string(),
        initial_elapsed_ms: task.time_spent_ms.saturating_add(resumed_ms),
        initial_running: open.is_some(),
        open_interval: open.as_ref().map(|interval| interval.id.clone()),
        tick_period,
    };
    let resumed = open.is_some();

    let log = Arc::new(SqliteTimeLog::new(db));
    let observer = Arc::new(ConsoleObserver::new(out));
    let tracker = TimeTracker::mount(config, Arc::clone(&log), observer);

    if resumed {
        tracing::info!(%task_id, "resuming open interval");
    } else {
        match tracker.start().await {
            Outcome::Started(_) => {}
            Outcome::Failed(err) => bail!("failed to start tracking: {err}"),
            other => bail!("tracker did not start: {other:?}"),
        }
    }

    until.await;

    let outcome = tracker.stop().await;
    let elapsed_ms = tracker.snapshot().elapsed_ms;
    tracker.unmount();

    match outcome {
        Outcome::Stopped(closed) => {
            log.db().set_task_time_spent(task_id, elapsed_ms)?;
            tracing::debug!(%task_id, elapsed_ms, "saved task time");
            Ok(Session {
                elapsed_ms,
                closed,
                resumed,
            })
        }
        Outcome::Failed(err) => {
            tracing::warn!(%task_id, elapsed_ms, "interval left open; task time not saved");
            bail!("failed to stop tracking: {err}")
        }
        other => bail!("tracker did not stop: {other:?}"),
    }
}

/// Completes after `duration`, or on Ctrl-C when no duration is given.
pub async fn wait_for(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(%err, "cannot listen for Ctrl-C, stopping");
            }
        }
    }
}
