//! Taskflow CLI library.
//!
//! This crate provides the command-line interface over the task store and
//! the per-task time tracker.

mod cli;
pub mod commands;
mod config;

pub use cli::{
    Cli, Commands, FilterArgs, IntervalsAction, ProjectAction, TaskAction, TaskAddArgs, TaskEditArgs,
    TrackArgs,
};
pub use config::Config;
