use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use std::str::FromStr;

use crate::data::{impl_text_column, UnknownVariant};
use crate::seeds::data::SeedID;

pub type TaskID = i64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String")]
pub enum TaskType {
    Pack,
    Catalog,
    Reorder,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [TaskType::Pack, TaskType::Catalog, TaskType::Reorder];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Pack => "Pack",
            TaskType::Catalog => "Catalog",
            TaskType::Reorder => "Reorder",
        }
    }
}

impl FromStr for TaskType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<TaskType, UnknownVariant> {
        match s.trim().to_lowercase().as_str() {
            "pack" => Ok(TaskType::Pack),
            "catalog" | "catalogue" => Ok(TaskType::Catalog),
            "reorder" => Ok(TaskType::Reorder),
            _ => Err(UnknownVariant {
                kind: "task type",
                value: s.to_string(),
            }),
        }
    }
}

impl_text_column!(TaskType);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// ToDo and InProgress: the task still needs doing.
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::ToDo | TaskStatus::InProgress)
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<TaskStatus, UnknownVariant> {
        match s.trim().to_lowercase().as_str() {
            "" | "to do" | "todo" | "to_do" | "pending" => Ok(TaskStatus::ToDo),
            "in progress" | "in_progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            _ => Err(UnknownVariant {
                kind: "task status",
                value: s.to_string(),
            }),
        }
    }
}

impl_text_column!(TaskStatus);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "String")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<TaskPriority, UnknownVariant> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "" | "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(UnknownVariant {
                kind: "task priority",
                value: s.to_string(),
            }),
        }
    }
}

impl_text_column!(TaskPriority);

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskID,
    pub seed_id: SeedID,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_type: Option<String>,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.map_or(false, |due| due < today)
    }

    pub fn is_due_today(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date == Some(today)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub seed_id: SeedID,
    pub task_type: TaskType,
    pub due_date: NaiveDate,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    ToDo,
    InProgress,
    Done,
    Cancelled,
    Overdue,
}

impl FromStr for TaskFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<TaskFilter, UnknownVariant> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "to_do" => Ok(TaskFilter::ToDo),
            "in_progress" => Ok(TaskFilter::InProgress),
            "done" => Ok(TaskFilter::Done),
            "cancelled" => Ok(TaskFilter::Cancelled),
            "overdue" => Ok(TaskFilter::Overdue),
            _ => Err(UnknownVariant {
                kind: "task filter",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

#[derive(Deserialize, Debug, Default)]
pub struct BulkUpdateRequest {
    pub task_ids: Vec<TaskID>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl BulkUpdateRequest {
    pub fn has_changes(&self) -> bool {
        self.status.is_some() || self.priority.is_some() || self.due_date.is_some()
    }
}

#[derive(Serialize, Debug)]
pub struct BulkUpdateResult {
    pub updated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_spellings_normalize() {
        assert_eq!("pending".parse::<TaskStatus>().unwrap(), TaskStatus::ToDo);
        assert_eq!("To Do".parse::<TaskStatus>().unwrap(), TaskStatus::ToDo);
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("CANCELED".parse::<TaskStatus>().unwrap(), TaskStatus::Cancelled);
        assert!("finished-ish".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_round_trips_through_json_text() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");

        let parsed: TaskStatus = serde_json::from_str("\"in progress\"").unwrap();
        assert_eq!(parsed, TaskStatus::InProgress);
    }

    #[test]
    fn only_todo_and_in_progress_are_open() {
        assert!(TaskStatus::ToDo.is_open());
        assert!(TaskStatus::InProgress.is_open());
        assert!(!TaskStatus::Done.is_open());
        assert!(!TaskStatus::Cancelled.is_open());
    }
}
