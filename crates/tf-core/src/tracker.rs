//! Per-task stopwatch that persists session boundaries to a [`TimeLog`].
//!
//! A [`TimeTracker`] owns the elapsed-time display for one task. While
//! running it drives a periodic local clock and reports every tick to its
//! [`TrackerObserver`]. Only `start` and `stop` reach the time log.
//!
//! # States
//!
//! ```text
//! Idle --start--> Starting --ok--> Running --stop--> Stopping --ok--> Idle
//!                    |err                               |err
//!                    v                                  v
//!                   Idle                             Unclosed --stop--> Stopping
//! ```
//!
//! `Starting` and `Stopping` hold the pending flag: any `start`, `stop` or
//! `toggle` issued while it is set is ignored. `Unclosed` means the clock is
//! halted but the remote interval is still open because closing it failed.
//!
//! # Ordering
//!
//! The tick task re-checks the run generation under the state lock before
//! publishing, and `stop` bumps the generation before awaiting the time log,
//! so no tick is delivered once a stop has been accepted. Observer callbacks
//! run while the state lock is held and must not call back into the tracker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::interval::{ClosedInterval, DEFAULT_TASK_LABEL};
use crate::timelog::{TimeLog, TimeLogError};
use crate::types::{IntervalId, TaskId};

/// Default refresh period of the displayed elapsed time.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Lifecycle phase of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Stopping,
    /// Clock halted after a failed stop; the remote interval is still open.
    Unclosed,
}

impl Phase {
    /// Whether a start/stop request is in flight.
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Starting | Self::Stopping)
    }

    /// Whether the local clock is ticking.
    pub const fn is_ticking(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

/// Parameters supplied by the owner when mounting a tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Task to persist intervals for. `None` runs the tracker locally only.
    pub task_id: Option<TaskId>,
    /// Display label, used to name persisted intervals.
    pub task_label: String,
    pub initial_elapsed_ms: u64,
    pub initial_running: bool,
    /// Interval left open by a previous session, closed by the next stop.
    pub open_interval: Option<IntervalId>,
    pub tick_period: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            task_id: None,
            task_label: DEFAULT_TASK_LABEL.to_string(),
            initial_elapsed_ms: 0,
            initial_running: false,
            open_interval: None,
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }
}

impl TrackerConfig {
    /// Config for a tracker persisting intervals for `task_id`.
    pub fn for_task(task_id: TaskId, task_label: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id),
            task_label: task_label.into(),
            ..Self::default()
        }
    }
}

/// What the owner renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerViewState {
    pub elapsed_ms: u64,
    pub running: bool,
    pub pending: bool,
    pub phase: Phase,
    pub open_interval: Option<IntervalId>,
}

impl TrackerViewState {
    /// Whether the toggle control should be enabled.
    pub const fn can_toggle(&self) -> bool {
        !self.pending
    }

    /// Whether the reset control should be enabled.
    pub const fn can_reset(&self) -> bool {
        !self.running && !self.pending && self.elapsed_ms > 0
    }
}

/// Transient notifications for the owner (toasts, log lines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Started {
        interval_id: Option<IntervalId>,
    },
    Stopped {
        interval_id: Option<IntervalId>,
        duration_seconds: Option<u64>,
    },
    StartFailed {
        error: TimeLogError,
    },
    StopFailed {
        interval_id: IntervalId,
        error: TimeLogError,
    },
}

/// Why an operation was not performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// A start or stop request is in flight.
    Pending,
    /// The operation is not valid in the current phase.
    InvalidPhase(Phase),
    /// The tracker was unmounted.
    TornDown,
}

/// Result of a tracker operation. Failures are values, never panics or
/// propagated errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// Tracking started; carries the opened interval in persistence mode.
    Started(Option<IntervalId>),
    /// Tracking stopped; carries the closed interval in persistence mode.
    Stopped(Option<ClosedInterval>),
    Reset,
    Ignored(Ignored),
    Failed(TimeLogError),
}

/// Receives elapsed-time updates and notices from a tracker.
pub trait TrackerObserver: Send + Sync + 'static {
    /// Called on every tick and on reset.
    fn on_elapsed_change(&self, elapsed_ms: u64);

    fn notify(&self, notice: Notice) {
        let _ = notice;
    }
}

#[derive(Debug)]
struct TrackerState {
    elapsed_ms: u64,
    phase: Phase,
    open_interval: Option<IntervalId>,
    /// Incremented whenever a clock run starts or halts.
    generation: u64,
    ticker: Option<JoinHandle<()>>,
    mounted: bool,
}

impl TrackerState {
    fn view(&self) -> TrackerViewState {
        TrackerViewState {
            elapsed_ms: self.elapsed_ms,
            running: self.phase.is_ticking(),
            pending: self.phase.is_pending(),
            phase: self.phase,
            open_interval: self.open_interval.clone(),
        }
    }

    fn halt_clock(&mut self) {
        self.generation += 1;
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

struct Shared {
    state: Mutex<TrackerState>,
    observer: Arc<dyn TrackerObserver>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stopwatch for one task.
pub struct TimeTracker<L> {
    log: Arc<L>,
    shared: Arc<Shared>,
    task_id: Option<TaskId>,
    task_label: String,
    tick_period: Duration,
}

impl<L: TimeLog> TimeTracker<L> {
    /// Creates the tracker state for a mounted owner.
    ///
    /// With `initial_running` the clock starts immediately from
    /// `initial_elapsed_ms`, so this must then be called inside a tokio
    /// runtime. A supplied `open_interval` without `initial_running` mounts
    /// in [`Phase::Unclosed`].
    pub fn mount(config: TrackerConfig, log: Arc<L>, observer: Arc<dyn TrackerObserver>) -> Self {
        let phase = match (config.initial_running, &config.open_interval) {
            (true, _) => Phase::Running,
            (false, Some(_)) if config.task_id.is_some() => Phase::Unclosed,
            (false, _) => Phase::Idle,
        };
        let open_interval = config.task_id.as_ref().and(config.open_interval);
        let tracker = Self {
            log,
            shared: Arc::new(Shared {
                state: Mutex::new(TrackerState {
                    elapsed_ms: config.initial_elapsed_ms,
                    phase,
                    open_interval,
                    generation: 0,
                    ticker: None,
                    mounted: true,
                }),
                observer,
            }),
            task_id: config.task_id,
            task_label: config.task_label,
            tick_period: config.tick_period.max(Duration::from_millis(1)),
        };
        if phase == Phase::Running {
            let mut state = tracker.shared.lock();
            tracker.start_clock(&mut state);
            drop(state);
        }
        tracing::debug!(task_id = ?tracker.task_id, ?phase, "tracker mounted");
        tracker
    }

    /// Current display state.
    pub fn snapshot(&self) -> TrackerViewState {
        self.shared.lock().view()
    }

    /// Starts tracking. Valid only from [`Phase::Idle`].
    pub async fn start(&self) -> Outcome {
        let (task_id, previous_elapsed) = {
            let mut state = self.shared.lock();
            if let Err(ignored) = check_phase(&state, &[Phase::Idle]) {
                tracing::debug!(?ignored, "start ignored");
                return Outcome::Ignored(ignored);
            }
            let previous = state.elapsed_ms;
            self.start_clock(&mut state);

            let Some(task_id) = self.task_id.as_ref() else {
                state.phase = Phase::Running;
                self.shared
                    .observer
                    .notify(Notice::Started { interval_id: None });
                tracing::debug!("local tracking started");
                return Outcome::Started(None);
            };
            state.phase = Phase::Starting;
            (task_id, previous)
        };

        let result = self.log.begin_interval(task_id, &self.task_label).await;

        let mut state = self.shared.lock();
        if !state.mounted {
            tracing::debug!(%task_id, "discarding start completion after unmount");
            return Outcome::Ignored(Ignored::TornDown);
        }
        match result {
            Ok(interval_id) => {
                tracing::info!(%task_id, %interval_id, "time tracking started");
                state.open_interval = Some(interval_id.clone());
                state.phase = Phase::Running;
                self.shared.observer.notify(Notice::Started {
                    interval_id: Some(interval_id.clone()),
                });
                Outcome::Started(Some(interval_id))
            }
            Err(error) => {
                tracing::warn!(%task_id, %error, "failed to start time tracking");
                state.halt_clock();
                state.phase = Phase::Idle;
                if state.elapsed_ms != previous_elapsed {
                    state.elapsed_ms = previous_elapsed;
                    self.shared.observer.on_elapsed_change(previous_elapsed);
                }
                self.shared.observer.notify(Notice::StartFailed {
                    error: error.clone(),
                });
                Outcome::Failed(error)
            }
        }
    }

    /// Stops tracking. Valid from [`Phase::Running`] and, to retry a failed
    /// close, from [`Phase::Unclosed`].
    ///
    /// The clock halts before the time log is contacted and stays halted
    /// whatever the outcome. The last displayed elapsed value is kept.
    pub async fn stop(&self) -> Outcome {
        let interval_id = {
            let mut state = self.shared.lock();
            if let Err(ignored) = check_phase(&state, &[Phase::Running, Phase::Unclosed]) {
                tracing::debug!(?ignored, "stop ignored");
                return Outcome::Ignored(ignored);
            }
            state.halt_clock();

            let Some(task_id) = self.task_id.as_ref() else {
                state.phase = Phase::Idle;
                self.shared.observer.notify(Notice::Stopped {
                    interval_id: None,
                    duration_seconds: None,
                });
                tracing::debug!(elapsed_ms = state.elapsed_ms, "local tracking stopped");
                return Outcome::Stopped(None);
            };
            let Some(interval_id) = state.open_interval.clone() else {
                tracing::warn!(
                    %task_id,
                    "stop requested with no recorded interval; stopping locally"
                );
                state.phase = Phase::Idle;
                self.shared.observer.notify(Notice::Stopped {
                    interval_id: None,
                    duration_seconds: None,
                });
                return Outcome::Stopped(None);
            };
            state.phase = Phase::Stopping;
            interval_id
        };

        let result = self.log.end_interval(&interval_id).await;

        let mut state = self.shared.lock();
        if !state.mounted {
            tracing::debug!(%interval_id, "discarding stop completion after unmount");
            return Outcome::Ignored(Ignored::TornDown);
        }
        match result {
            Ok(closed) => {
                tracing::info!(
                    %interval_id,
                    duration_seconds = closed.duration_seconds,
                    "time tracking stopped"
                );
                state.open_interval = None;
                state.phase = Phase::Idle;
                self.shared.observer.notify(Notice::Stopped {
                    interval_id: Some(interval_id),
                    duration_seconds: Some(closed.duration_seconds),
                });
                Outcome::Stopped(Some(closed))
            }
            Err(error) => {
                tracing::warn!(%interval_id, %error, "failed to stop time tracking; interval left open");
                state.phase = Phase::Unclosed;
                self.shared.observer.notify(Notice::StopFailed {
                    interval_id,
                    error: error.clone(),
                });
                Outcome::Failed(error)
            }
        }
    }

    /// Starts when idle, stops when running or unclosed.
    pub async fn toggle(&self) -> Outcome {
        let phase = self.shared.lock().phase;
        match phase {
            Phase::Idle => self.start().await,
            Phase::Running | Phase::Unclosed => self.stop().await,
            Phase::Starting | Phase::Stopping => Outcome::Ignored(Ignored::Pending),
        }
    }

    /// Clears the displayed elapsed time. Never contacts the time log.
    pub fn reset(&self) -> Outcome {
        let mut state = self.shared.lock();
        if let Err(ignored) = check_phase(&state, &[Phase::Idle, Phase::Unclosed]) {
            tracing::debug!(?ignored, "reset ignored");
            return Outcome::Ignored(ignored);
        }
        state.elapsed_ms = 0;
        self.shared.observer.on_elapsed_change(0);
        Outcome::Reset
    }

    /// Tears the tracker down.
    ///
    /// The clock is cleared unconditionally. Requests already in flight run
    /// to completion but their results are discarded.
    pub fn unmount(&self) {
        let mut state = self.shared.lock();
        if state.mounted {
            state.mounted = false;
            state.halt_clock();
            tracing::debug!(task_id = ?self.task_id, "tracker unmounted");
        }
    }

    fn start_clock(&self, state: &mut TrackerState) {
        state.halt_clock();
        let generation = state.generation;
        let base_ms = state.elapsed_ms;
        let period = self.tick_period;
        let shared = Arc::clone(&self.shared);
        let started = Instant::now();

        state.ticker = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(started + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let mut state = shared.lock();
                if !state.mounted || state.generation != generation || !state.phase.is_ticking() {
                    return;
                }
                let elapsed_ms = base_ms.saturating_add(duration_ms(started.elapsed()));
                state.elapsed_ms = state.elapsed_ms.max(elapsed_ms);
                shared.observer.on_elapsed_change(state.elapsed_ms);
            }
        }));
    }
}

impl<L> Drop for TimeTracker<L> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.mounted = false;
        state.halt_clock();
    }
}

fn check_phase(state: &TrackerState, allowed: &[Phase]) -> Result<(), Ignored> {
    if !state.mounted {
        return Err(Ignored::TornDown);
    }
    if state.phase.is_pending() {
        return Err(Ignored::Pending);
    }
    if allowed.contains(&state.phase) {
        Ok(())
    } else {
        Err(Ignored::InvalidPhase(state.phase))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
