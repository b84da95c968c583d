use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BoardError, Result};

/// Opaque task identifier. Generated once by the store and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate() -> Self {
        TaskId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(BoardError::validation(
                "priority",
                format!("unknown priority '{}'", other),
            )),
        }
    }
}

/// Workflow status of a task. Every status is reachable from every other.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "review")]
    Review,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "closed")]
    Closed,
}

impl TaskStatus {
    /// Board order, left to right.
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Completed,
        TaskStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
            TaskStatus::Closed => "closed",
        }
    }

    /// Drop-target identifier of this status' kanban column.
    pub fn column_id(&self) -> String {
        format!("{}-column", self.as_str())
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Review => "Review",
            TaskStatus::Completed => "Completed",
            TaskStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        TaskStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BoardError::invalid_transition(s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub estimated_hours: f64,
    pub deadline: DateTime<Utc>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Advance `updated_at` to now, never moving it backwards.
    pub(crate) fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Editor form value pre-filled from this task.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            estimated_hours: self.estimated_hours,
            deadline: self.deadline.to_rfc3339(),
            status: Some(self.status),
        }
    }
}

/// Editor form value, as submitted by the task dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_estimated_hours")]
    pub estimated_hours: f64,
    /// RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
    #[serde(default)]
    pub deadline: String,
    pub status: Option<TaskStatus>,
}

fn default_estimated_hours() -> f64 {
    1.0
}

impl TaskDraft {
    /// Empty draft for a new task in the given column.
    pub fn new_in(status: TaskStatus) -> Self {
        TaskDraft {
            title: String::new(),
            description: String::new(),
            priority: Priority::default(),
            estimated_hours: default_estimated_hours(),
            deadline: String::new(),
            status: Some(status),
        }
    }

    pub fn validated(&self) -> Result<ValidDraft> {
        validate_title(&self.title)?;
        validate_hours(self.estimated_hours)?;
        let deadline = parse_deadline(&self.deadline)?;
        Ok(ValidDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            estimated_hours: self.estimated_hours,
            deadline,
            status: self.status.unwrap_or_default(),
        })
    }
}

/// Task fields that passed validation; the store adds identity and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub estimated_hours: f64,
    pub deadline: DateTime<Utc>,
    pub status: TaskStatus,
}

impl ValidDraft {
    pub(crate) fn into_task(self, task_id: TaskId, now: DateTime<Utc>) -> Task {
        Task {
            task_id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            estimated_hours: self.estimated_hours,
            deadline: self.deadline,
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply_to(self, task: &mut Task) {
        task.title = self.title;
        task.description = self.description;
        task.priority = self.priority;
        task.estimated_hours = self.estimated_hours;
        task.deadline = self.deadline;
        task.status = self.status;
    }
}

/// A title is required; surrounding whitespace does not count, but the
/// title is stored as submitted.
pub(crate) fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(BoardError::validation("title", "title must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_hours(hours: f64) -> Result<()> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(BoardError::validation(
            "estimated_hours",
            format!("estimated hours must be a positive number, got {}", hours),
        ));
    }
    Ok(())
}

pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BoardError::validation("deadline", "deadline is required"));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| {
            BoardError::validation("deadline", format!("'{}' is not a valid timestamp", raw))
        })
}
