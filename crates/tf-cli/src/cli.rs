//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use tf_core::{
    DateRange, ProjectId, TaskFilter, TaskId, TaskPriority, TaskStatus, TaskUpdate,
};

/// Task manager with per-task time tracking.
#[derive(Debug, Parser)]
#[command(name = "tf", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectAction),

    /// Manage tasks.
    #[command(subcommand)]
    Task(TaskAction),

    /// Track time on a task until interrupted.
    Track(TrackArgs),

    /// Inspect and close time intervals.
    #[command(subcommand)]
    Intervals(IntervalsAction),

    /// Show task analytics.
    Report {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the database location and intervals left running.
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        name: String,

        /// Display color, e.g. #3b82f6.
        #[arg(long)]
        color: Option<String>,
    },
    /// List projects.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Rename a project or change its color.
    Edit {
        id: ProjectId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "clear_color")]
        color: Option<String>,

        /// Remove the color.
        #[arg(long)]
        clear_color: bool,
    },
    /// Delete a project. Its tasks are kept without a project.
    Delete { id: ProjectId },
}

#[derive(Debug, Subcommand)]
pub enum TaskAction {
    /// Create a task.
    Add(TaskAddArgs),
    /// List tasks.
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        json: bool,
    },
    /// Show a task with its tracked intervals.
    Show {
        id: TaskId,

        #[arg(long)]
        json: bool,
    },
    /// Edit a task's fields.
    Edit(TaskEditArgs),
    /// Change a task's status.
    Status { id: TaskId, status: TaskStatus },
    /// Delete a task and its intervals.
    Delete { id: TaskId },
}

#[derive(Debug, Args)]
pub struct TaskAddArgs {
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value_t = TaskStatus::NotStarted)]
    pub status: TaskStatus,

    #[arg(long, default_value_t = TaskPriority::Medium)]
    pub priority: TaskPriority,

    /// Due date (YYYY-MM-DD), not in the past.
    #[arg(long)]
    pub due: Option<chrono::NaiveDate>,

    #[arg(long)]
    pub project: Option<ProjectId>,

    #[arg(long)]
    pub assignee: Option<String>,

    /// Tag to attach; repeatable.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

/// Changes for `task edit`. Flags left out keep their current value.
#[derive(Debug, Args)]
pub struct TaskEditArgs {
    pub id: TaskId,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    /// Due date (YYYY-MM-DD), not in the past.
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<chrono::NaiveDate>,

    /// Remove the due date.
    #[arg(long)]
    pub clear_due: bool,

    #[arg(long, conflicts_with = "no_project")]
    pub project: Option<ProjectId>,

    /// Detach the task from its project.
    #[arg(long)]
    pub no_project: bool,

    #[arg(long, conflicts_with = "unassign")]
    pub assignee: Option<String>,

    /// Remove the assignee.
    #[arg(long)]
    pub unassign: bool,

    /// Replace the tags; repeatable.
    #[arg(long = "tag", conflicts_with = "clear_tags")]
    pub tags: Vec<String>,

    /// Remove all tags.
    #[arg(long)]
    pub clear_tags: bool,
}

impl TaskEditArgs {
    pub fn to_update(&self) -> TaskUpdate {
        TaskUpdate {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            due_date: clearable(self.due, self.clear_due),
            project_id: clearable(self.project.clone(), self.no_project),
            assigned_to: clearable(self.assignee.clone(), self.unassign),
            tags: if self.clear_tags {
                Some(Vec::new())
            } else if self.tags.is_empty() {
                None
            } else {
                Some(self.tags.clone())
            },
        }
    }
}

fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Task to track.
    pub task: TaskId,

    /// Stop automatically after this many seconds instead of waiting for Ctrl-C.
    #[arg(long)]
    pub duration: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum IntervalsAction {
    /// List intervals.
    List {
        /// Only intervals of this task.
        #[arg(long)]
        task: Option<TaskId>,

        #[arg(long)]
        json: bool,
    },
    /// Close an interval left running by a failed stop.
    Close { id: tf_core::IntervalId },
}

/// Dashboard filter flags.
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub project: Option<ProjectId>,

    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    /// Due-date window: all, week, month or quarter. Defaults to the
    /// configured `default_range`.
    #[arg(long)]
    pub range: Option<DateRange>,
}

impl FilterArgs {
    /// Builds the filter, using `default_range` when `--range` is absent.
    pub fn to_filter(&self, default_range: DateRange) -> TaskFilter {
        TaskFilter {
            project: self.project.clone(),
            assignee: self.assignee.clone(),
            status: self.status,
            date_range: self.range.unwrap_or(default_range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_task_add_with_flags() {
        let cli = Cli::parse_from([
            "tf",
            "task",
            "add",
            "Write docs",
            "--priority",
            "high",
            "--due",
            "2030-01-01",
            "--tag",
            "docs",
            "--tag",
            "writing",
        ]);
        let Some(Commands::Task(TaskAction::Add(args))) = cli.command else {
            panic!("expected task add");
        };
        assert_eq!(args.title, "Write docs");
        assert_eq!(args.priority, TaskPriority::High);
        assert_eq!(args.status, TaskStatus::NotStarted);
        assert_eq!(args.tags, vec!["docs", "writing"]);
    }

    #[test]
    fn rejects_unknown_status() {
        let result = Cli::try_parse_from(["tf", "task", "status", "abc", "done"]);
        assert!(result.is_err());
    }

    #[test]
    fn task_edit_builds_update() {
        let cli = Cli::parse_from([
            "tf",
            "task",
            "edit",
            "task-1",
            "--priority",
            "urgent",
            "--clear-due",
            "--no-project",
            "--tag",
            "ops",
        ]);
        let Some(Commands::Task(TaskAction::Edit(args))) = cli.command else {
            panic!("expected task edit");
        };
        let update = args.to_update();
        assert_eq!(update.priority, Some(TaskPriority::Urgent));
        assert_eq!(update.due_date, Some(None));
        assert_eq!(update.project_id, Some(None));
        assert_eq!(update.assigned_to, None);
        assert_eq!(update.tags, Some(vec!["ops".to_string()]));
        assert_eq!(update.title, None);
    }

    #[test]
    fn task_edit_rejects_conflicting_flags() {
        let result =
            Cli::try_parse_from(["tf", "task", "edit", "task-1", "--due", "2030-01-01", "--clear-due"]);
        assert!(result.is_err());
    }

    #[test]
    fn report_filter_defaults_to_all() {
        let cli = Cli::parse_from(["tf", "report", "--status", "on-hold"]);
        let Some(Commands::Report { filter, json }) = cli.command else {
            panic!("expected report");
        };
        assert!(!json);
        let filter = filter.to_filter(DateRange::All);
        assert_eq!(filter.status, Some(TaskStatus::OnHold));
        assert_eq!(filter.date_range, DateRange::All);
    }

    #[test]
    fn range_flag_overrides_configured_default() {
        let cli = Cli::parse_from(["tf", "task", "list"]);
        let Some(Commands::Task(TaskAction::List { filter, .. })) = cli.command else {
            panic!("expected task list");
        };
        assert_eq!(filter.to_filter(DateRange::Month).date_range, DateRange::Month);

        let cli = Cli::parse_from(["tf", "task", "list", "--range", "week"]);
        let Some(Commands::Task(TaskAction::List { filter, .. })) = cli.command else {
            panic!("expected task list");
        };
        assert_eq!(filter.to_filter(DateRange::Month).date_range, DateRange::Week);
    }
}
