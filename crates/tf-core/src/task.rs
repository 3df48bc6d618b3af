//! Tasks and projects.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProjectId, TaskId, ValidationError};

/// Minimum number of characters in a task title, after trimming.
pub const MIN_TITLE_LEN: usize = 3;

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    OnHold,
    Completed,
}

impl TaskStatus {
    /// Report order.
    pub const ALL: [Self; 4] = [
        Self::Completed,
        Self::InProgress,
        Self::NotStarted,
        Self::OnHold,
    ];

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-started" => Ok(Self::NotStarted),
            "in-progress" => Ok(Self::InProgress),
            "on-hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Priority of a task, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ValidationError::InvalidPriority {
                value: s.to_string(),
            }),
        }
    }
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Time shown in the task editor, in milliseconds.
    #[serde(default)]
    pub time_spent_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Label used when opening a time interval for this task.
    pub fn label(&self) -> &str {
        &self.title
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<ProjectId>,
    pub assigned_to: Option<String>,
    pub tags: Vec<String>,
}

impl NewTask {
    /// Creates a task draft with default status and priority.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Checks the editor form rules and normalizes the title.
    ///
    /// `today` is passed in so callers decide which calendar the due date is
    /// compared against.
    pub fn validate(self, today: NaiveDate) -> Result<Self, ValidationError> {
        if let Some(due) = self.due_date.filter(|due| *due < today) {
            return Err(ValidationError::DueDateInPast { due, today });
        }
        self.normalize()
    }

    /// Checks the rules that do not depend on the calendar: a non-empty
    /// title of at least [`MIN_TITLE_LEN`] characters. Trims the title and
    /// drops blank tags.
    pub fn normalize(mut self) -> Result<Self, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        if title.chars().count() < MIN_TITLE_LEN {
            return Err(ValidationError::TitleTooShort { min: MIN_TITLE_LEN });
        }
        self.title = title.to_string();
        self.tags.retain(|tag| !tag.trim().is_empty());
        Ok(self)
    }
}

/// Field changes for an existing task. `None` leaves a field unchanged; the
/// nested options of clearable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub project_id: Option<Option<ProjectId>>,
    pub assigned_to: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    /// Whether no field would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the changes into `task` and validates the result.
    ///
    /// The due date is only checked against `today` when it is being
    /// changed, so an overdue task can still be edited.
    pub fn apply(self, task: &Task, today: NaiveDate) -> Result<NewTask, ValidationError> {
        let due_changed = self.due_date.is_some();
        let draft = NewTask {
            title: self.title.unwrap_or_else(|| task.title.clone()),
            description: self
                .description
                .unwrap_or_else(|| task.description.clone()),
            status: self.status.unwrap_or(task.status),
            priority: self.priority.unwrap_or(task.priority),
            due_date: self.due_date.unwrap_or(task.due_date),
            project_id: self
                .project_id
                .unwrap_or_else(|| task.project_id.clone()),
            assigned_to: self
                .assigned_to
                .unwrap_or_else(|| task.assigned_to.clone()),
            tags: self.tags.unwrap_or_else(|| task.tags.clone()),
        };
        if due_changed {
            draft.validate(today)
        } else {
            draft.normalize()
        }
    }
}

/// A project grouping tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub color: Option<String>,
}

impl NewProject {
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty {
                field: "project name",
            });
        }
        self.name = name.to_string();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_roundtrip_all_variants() {
        for status in TaskStatus::ALL {
            let parsed: TaskStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_serde_uses_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn priority_orders_low_to_urgent() {
        assert!(TaskPriority::Low < TaskPriority::Urgent);
        assert_eq!("urgent".parse::<TaskPriority>(), Ok(TaskPriority::Urgent));
        assert!("critical".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn new_task_defaults() {
        let task = NewTask::new("Write docs");
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.priority, TaskPriority::Medium);
    }

    #[test]
    fn validate_trims_title() {
        let task = NewTask::new("  Ship it  ").validate(day(2026, 1, 1)).unwrap();
        assert_eq!(task.title, "Ship it");
    }

    #[test]
    fn validate_rejects_short_or_empty_title() {
        let today = day(2026, 1, 1);
        assert_eq!(
            NewTask::new("   ").validate(today),
            Err(ValidationError::Empty { field: "title" })
        );
        assert_eq!(
            NewTask::new("ab").validate(today),
            Err(ValidationError::TitleTooShort { min: 3 })
        );
    }

    #[test]
    fn validate_rejects_past_due_date() {
        let today = day(2026, 3, 10);
        let mut task = NewTask::new("Plan sprint");
        task.due_date = Some(day(2026, 3, 9));
        assert!(matches!(
            task.clone().validate(today),
            Err(ValidationError::DueDateInPast { .. })
        ));

        task.due_date = Some(today);
        assert!(task.validate(today).is_ok());
    }

    fn stored_task(due: Option<NaiveDate>) -> Task {
        Task {
            id: TaskId::new("task-1").unwrap(),
            title: "Plan sprint".to_string(),
            description: String::new(),
            status: TaskStatus::InProgress,
            priority: TaskPriority::Medium,
            due_date: due,
            time_spent_ms: 42_000,
            project_id: Some(ProjectId::new("proj-1").unwrap()),
            assigned_to: Some("kim".to_string()),
            tags: vec!["planning".to_string()],
            created_at: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn update_merges_changed_fields_only() {
        let task = stored_task(None);
        let update = TaskUpdate {
            title: Some("  Plan next sprint ".to_string()),
            priority: Some(TaskPriority::Urgent),
            project_id: Some(None),
            tags: Some(vec!["planning".to_string(), " ".to_string()]),
            ..TaskUpdate::default()
        };

        let draft = update.apply(&task, day(2026, 3, 10)).unwrap();
        assert_eq!(draft.title, "Plan next sprint");
        assert_eq!(draft.priority, TaskPriority::Urgent);
        assert_eq!(draft.status, TaskStatus::InProgress);
        assert_eq!(draft.project_id, None);
        assert_eq!(draft.assigned_to.as_deref(), Some("kim"));
        assert_eq!(draft.tags, vec!["planning"]);
    }

    #[test]
    fn update_revalidates_title_and_new_due_date() {
        let today = day(2026, 3, 10);
        let task = stored_task(None);

        let short = TaskUpdate {
            title: Some("ab".to_string()),
            ..TaskUpdate::default()
        };
        assert_eq!(
            short.apply(&task, today),
            Err(ValidationError::TitleTooShort { min: 3 })
        );

        let past = TaskUpdate {
            due_date: Some(Some(day(2026, 3, 1))),
            ..TaskUpdate::default()
        };
        assert!(matches!(
            past.apply(&task, today),
            Err(ValidationError::DueDateInPast { .. })
        ));
    }

    #[test]
    fn update_keeps_existing_overdue_date() {
        let task = stored_task(Some(day(2026, 3, 1)));
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..TaskUpdate::default()
        };
        assert!(!update.is_empty());
        let draft = update.apply(&task, day(2026, 3, 10)).unwrap();
        assert_eq!(draft.due_date, Some(day(2026, 3, 1)));
        assert!(TaskUpdate::default().is_empty());
    }

    #[test]
    fn new_project_requires_name() {
        assert!(NewProject::default().validate().is_err());
        let project = NewProject {
            name: " Website ".into(),
            color: None,
        }
        .validate()
        .unwrap();
        assert_eq!(project.name, "Website");
    }
}
