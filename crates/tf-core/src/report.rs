//! Aggregate analytics over a filtered task list.

use std::collections::HashMap;

use serde::Serialize;

use crate::task::{Project, Task, TaskPriority, TaskStatus};
use crate::types::ProjectId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTime {
    pub project_id: ProjectId,
    pub name: String,
    pub minutes: u64,
}

/// Summary shown on the reporting dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub total_tasks: usize,
    /// Ordered completed, in-progress, not-started, on-hold.
    pub by_status: Vec<StatusCount>,
    /// Ordered low to urgent.
    pub by_priority: Vec<PriorityCount>,
    /// One entry per known project, in the order given.
    pub time_by_project: Vec<ProjectTime>,
    /// Minutes on tasks without a project.
    pub unassigned_minutes: u64,
    /// Share of completed tasks, rounded to a whole percent.
    pub completion_percent: u32,
}

impl Report {
    pub fn build<'a>(tasks: impl IntoIterator<Item = &'a Task>, projects: &[Project]) -> Self {
        let mut status_counts: HashMap<TaskStatus, usize> = HashMap::new();
        let mut priority_counts: HashMap<TaskPriority, usize> = HashMap::new();
        let mut project_ms: HashMap<&ProjectId, u64> = HashMap::new();
        let mut unassigned_ms = 0_u64;
        let mut total_tasks = 0_usize;

        for task in tasks {
            total_tasks += 1;
            *status_counts.entry(task.status).or_default() += 1;
            *priority_counts.entry(task.priority).or_default() += 1;
            match &task.project_id {
                Some(project_id) => {
                    let total = project_ms.entry(project_id).or_default();
                    *total = total.saturating_add(task.time_spent_ms);
                }
                None => unassigned_ms = unassigned_ms.saturating_add(task.time_spent_ms),
            }
        }

        let completed = status_counts
            .get(&TaskStatus::Completed)
            .copied()
            .unwrap_or(0);

        Self {
            total_tasks,
            by_status: TaskStatus::ALL
                .iter()
                .map(|status| StatusCount {
                    status: *status,
                    count: status_counts.get(status).copied().unwrap_or(0),
                })
                .collect(),
            by_priority: TaskPriority::ALL
                .iter()
                .map(|priority| PriorityCount {
                    priority: *priority,
                    count: priority_counts.get(priority).copied().unwrap_or(0),
                })
                .collect(),
            time_by_project: projects
                .iter()
                .map(|project| ProjectTime {
                    project_id: project.id.clone(),
                    name: project.name.clone(),
                    minutes: round_minutes(project_ms.get(&project.id).copied().unwrap_or(0)),
                })
                .collect(),
            unassigned_minutes: round_minutes(unassigned_ms),
            completion_percent: percent(completed, total_tasks),
        }
    }
}

fn round_minutes(ms: u64) -> u64 {
    ms.saturating_add(30_000) / 60_000
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    u32::try_from((part * 100 + total / 2) / total).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::task;
    use chrono::{TimeZone, Utc};

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: ProjectId::new(id).unwrap(),
            name: name.to_string(),
            color: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_report() {
        let report = Report::build(&[], &[]);
        assert_eq!(report.total_tasks, 0);
        assert_eq!(report.completion_percent, 0);
        assert!(report.by_status.iter().all(|s| s.count == 0));
        assert_eq!(report.by_status[0].status, TaskStatus::Completed);
    }

    #[test]
    fn counts_and_time_per_project() {
        let web = project("web", "Website");
        let api = project("api", "API");

        let mut a = task("a", TaskStatus::Completed, None);
        a.project_id = Some(web.id.clone());
        a.time_spent_ms = 90_000;
        a.priority = TaskPriority::Urgent;
        let mut b = task("b", TaskStatus::InProgress, None);
        b.project_id = Some(web.id.clone());
        b.time_spent_ms = 29_000;
        let mut c = task("c", TaskStatus::NotStarted, None);
        c.time_spent_ms = 600_000;

        let tasks = [a, b, c];
        let report = Report::build(&tasks, &[web, api]);

        assert_eq!(report.total_tasks, 3);
        let statuses: Vec<_> = report.by_status.iter().map(|s| s.count).collect();
        assert_eq!(statuses, vec![1, 1, 1, 0]);
        let priorities: Vec<_> = report.by_priority.iter().map(|p| p.count).collect();
        assert_eq!(priorities, vec![0, 2, 0, 1]);
        // 119 seconds round to 2 minutes.
        assert_eq!(report.time_by_project[0].minutes, 2);
        assert_eq!(report.time_by_project[1].minutes, 0);
        assert_eq!(report.unassigned_minutes, 10);
        assert_eq!(report.completion_percent, 33);
    }
}
