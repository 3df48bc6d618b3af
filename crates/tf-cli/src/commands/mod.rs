//! CLI subcommand implementations.

pub mod intervals;
pub mod project;
pub mod report;
pub mod status;
pub mod task;
pub mod track;
