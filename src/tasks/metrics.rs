use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::internal_error::InternalResult;

use super::data::{Task, TaskStatus};
use super::helpers::get_all_tasks;

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct TaskMetrics {
    pub total: usize,
    pub done: usize,
    pub in_progress: usize,
    pub to_do: usize,
    pub cancelled: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub completion_percentage: f64,
}

pub fn compute_metrics(tasks: &[Task], today: NaiveDate) -> TaskMetrics {
    let mut metrics = TaskMetrics {
        total: tasks.len(),
        ..TaskMetrics::default()
    };

    for task in tasks {
        match task.status {
            TaskStatus::Done => metrics.done += 1,
            TaskStatus::InProgress => metrics.in_progress += 1,
            TaskStatus::ToDo => metrics.to_do += 1,
            TaskStatus::Cancelled => metrics.cancelled += 1,
        }

        if task.is_overdue(today) {
            metrics.overdue += 1;
        } else if task.is_due_today(today) {
            metrics.due_today += 1;
        }
    }

    metrics.completion_percentage = completion_percentage(metrics.done, metrics.total);
    metrics
}

/// Percentage rounded to one decimal place; 0 when there is nothing to complete.
pub fn completion_percentage(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    (done as f64 / total as f64 * 1000.0).round() / 10.0
}

pub fn calculate_task_metrics(today: NaiveDate, db_connection: &Connection) -> InternalResult<TaskMetrics> {
    let tasks = get_all_tasks(db_connection)?;
    Ok(compute_metrics(&tasks, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::data::{TaskPriority, TaskType};
    use chrono::{Duration, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn task(id: i64, status: TaskStatus, due_offset: Option<i64>) -> Task {
        Task {
            id,
            seed_id: 1,
            task_type: TaskType::Pack,
            status,
            priority: TaskPriority::Medium,
            due_date: due_offset.map(|days| today() + Duration::days(days)),
            completed_at: None,
            description: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            seed_name: None,
            seed_type: None,
        }
    }

    #[test]
    fn no_tasks_means_zero_percent() {
        let metrics = compute_metrics(&[], today());

        assert_eq!(metrics, TaskMetrics::default());
        assert_eq!(metrics.completion_percentage, 0.0);
    }

    #[test]
    fn ten_tasks_four_done() {
        let tasks = vec![
            task(1, TaskStatus::Done, Some(-3)),
            task(2, TaskStatus::Done, Some(0)),
            task(3, TaskStatus::Done, None),
            task(4, TaskStatus::Done, Some(2)),
            task(5, TaskStatus::ToDo, Some(-1)),
            task(6, TaskStatus::InProgress, Some(-10)),
            task(7, TaskStatus::ToDo, Some(0)),
            task(8, TaskStatus::InProgress, Some(0)),
            task(9, TaskStatus::Cancelled, Some(-5)),
            task(10, TaskStatus::ToDo, None),
        ];

        let metrics = compute_metrics(&tasks, today());

        assert_eq!(
            metrics,
            TaskMetrics {
                total: 10,
                done: 4,
                in_progress: 2,
                to_do: 3,
                cancelled: 1,
                overdue: 2,
                due_today: 2,
                completion_percentage: 40.0,
            }
        );
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(completion_percentage(1, 3), 33.3);
        assert_eq!(completion_percentage(2, 3), 66.7);
        assert_eq!(completion_percentage(1, 4), 25.0);
        assert_eq!(completion_percentage(0, 5), 0.0);
    }
}
