//! Dashboard task filtering.

use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskStatus};
use crate::types::{ProjectId, ValidationError};

/// How far back the due-date filter reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Week,
    Month,
    Quarter,
}

impl DateRange {
    /// Earliest due date that passes the filter, or `None` for [`DateRange::All`].
    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::All => None,
            Self::Week => today.checked_sub_days(chrono::Days::new(7)),
            Self::Month => today.checked_sub_months(Months::new(1)),
            Self::Quarter => today.checked_sub_months(Months::new(3)),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DateRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            _ => Err(ValidationError::InvalidDateRange {
                value: s.to_string(),
            }),
        }
    }
}

/// Criteria for narrowing the task list. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub project: Option<ProjectId>,
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub date_range: DateRange,
}

impl TaskFilter {
    /// Whether `task` passes every criterion.
    ///
    /// Tasks without a due date only pass [`DateRange::All`].
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if self
            .project
            .as_ref()
            .is_some_and(|project| task.project_id.as_ref() != Some(project))
        {
            return false;
        }
        if self
            .assignee
            .as_deref()
            .is_some_and(|assignee| task.assigned_to.as_deref() != Some(assignee))
        {
            return false;
        }
        if self.status.is_some_and(|status| task.status != status) {
            return false;
        }
        match self.date_range.cutoff(today) {
            None => true,
            Some(cutoff) => task.due_date.is_some_and(|due| due >= cutoff),
        }
    }

    /// Returns the tasks that pass, preserving order.
    pub fn apply<'a>(&self, tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
        tasks
            .iter()
            .filter(|task| self.matches(task, today))
            .collect()
    }
}
