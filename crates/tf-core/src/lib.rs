//! Core domain logic for taskflow.
//!
//! This crate contains:
//! - Tasks and projects with their validation rules
//! - The [`TimeTracker`] stopwatch and the [`TimeLog`] store contract it persists through
//! - Dashboard filtering and report aggregation

pub mod filter;
pub mod format;
pub mod interval;
pub mod report;
pub mod task;
mod timelog;
pub mod tracker;
pub mod types;

pub use filter::{DateRange, TaskFilter};
pub use format::format_elapsed;
pub use interval::{ClosedInterval, TimeInterval};
pub use report::Report;
pub use task::{NewProject, NewTask, Project, Task, TaskPriority, TaskStatus, TaskUpdate};
pub use timelog::{TimeLog, TimeLogError};
pub use tracker::{
    Ignored, Notice, Outcome, Phase, TimeTracker, TrackerConfig, TrackerObserver,
    TrackerViewState,
};
pub use types::{IntervalId, ProjectId, TaskId, ValidationError};
