use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::internal_error::{InternalError, InternalResult};
use crate::seeds::data::SeedID;

use super::data::*;

const TASK_SELECT: &str = "SELECT tasks.id, tasks.seed_id, tasks.task_type, tasks.status, tasks.priority, \
     tasks.due_date, tasks.completed_at, tasks.description, tasks.created_at, tasks.updated_at, \
     seeds.name, seeds.type \
     FROM tasks LEFT JOIN seeds ON seeds.id = tasks.seed_id";

pub fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        seed_id: row.get(1)?,
        task_type: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        due_date: row.get(5)?,
        completed_at: row.get(6)?,
        description: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        seed_name: row.get(10)?,
        seed_type: row.get(11)?,
    })
}

pub fn get_all_tasks(db_connection: &Connection) -> InternalResult<Vec<Task>> {
    let mut statement = db_connection.prepare(&format!(
        "{} ORDER BY tasks.created_at DESC, tasks.id DESC",
        TASK_SELECT
    ))?;

    let tasks = statement
        .query_map([], task_from_row)?
        .collect::<rusqlite::Result<Vec<Task>>>()?;

    Ok(tasks)
}

pub fn get_tasks_for_seed(seed_id: SeedID, db_connection: &Connection) -> InternalResult<Vec<Task>> {
    let mut statement = db_connection.prepare(&format!(
        "{} WHERE tasks.seed_id = ?1 ORDER BY tasks.created_at DESC, tasks.id DESC",
        TASK_SELECT
    ))?;

    let tasks = statement
        .query_map(params![seed_id], task_from_row)?
        .collect::<rusqlite::Result<Vec<Task>>>()?;

    Ok(tasks)
}

pub fn get_task(task_id: TaskID, db_connection: &Connection) -> InternalResult<Option<Task>> {
    let task = db_connection
        .query_row(
            &format!("{} WHERE tasks.id = ?1", TASK_SELECT),
            params![task_id],
            task_from_row,
        )
        .optional()?;

    Ok(task)
}

pub fn require_task(task_id: TaskID, db_connection: &Connection) -> InternalResult<Task> {
    get_task(task_id, db_connection)?.ok_or_else(|| InternalError::NotFound(format!("Task {}", task_id)))
}

pub fn insert_task(new_task: &NewTask, db_connection: &Connection) -> InternalResult<TaskID> {
    let now = Utc::now();

    db_connection.execute(
        "INSERT INTO tasks (seed_id, task_type, status, priority, due_date, description, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            new_task.seed_id,
            new_task.task_type,
            TaskStatus::ToDo,
            TaskPriority::default(),
            new_task.due_date,
            new_task.description,
            now,
        ],
    )?;

    Ok(db_connection.last_insert_rowid())
}

/// Done stamps `completed_at`; every other status clears it.
pub fn set_task_status(
    task_id: TaskID,
    status: TaskStatus,
    db_connection: &Connection,
) -> InternalResult<Task> {
    let now = Utc::now();
    let completed_at = match status {
        TaskStatus::Done => Some(now),
        _ => None,
    };

    let changed = db_connection.execute(
        "UPDATE tasks SET status = ?1, completed_at = ?2, updated_at = ?3 WHERE id = ?4",
        params![status, completed_at, now, task_id],
    )?;

    if changed == 0 {
        return Err(InternalError::NotFound(format!("Task {}", task_id)));
    }
    tracing::info!(task_id, status = status.as_str(), "updated task status");

    require_task(task_id, db_connection)
}

pub fn set_task_description(
    task_id: TaskID,
    description: &str,
    db_connection: &Connection,
) -> InternalResult<()> {
    db_connection.execute(
        "UPDATE tasks SET description = ?1, updated_at = ?2 WHERE id = ?3",
        params![description, Utc::now(), task_id],
    )?;

    Ok(())
}

pub fn bulk_update_tasks(
    request: &BulkUpdateRequest,
    db_connection: &Connection,
) -> InternalResult<BulkUpdateResult> {
    if request.task_ids.is_empty() {
        return Err(InternalError::Validation(
            "Select at least one task to apply bulk changes.".to_string(),
        ));
    }
    if !request.has_changes() {
        return Ok(BulkUpdateResult { updated: 0 });
    }

    let transaction = db_connection.unchecked_transaction()?;
    let now = Utc::now();
    let mut updated = 0;

    for task_id in &request.task_ids {
        if get_task(*task_id, &transaction)?.is_none() {
            tracing::warn!(task_id, "bulk update skipped unknown task");
            continue;
        }

        if let Some(status) = request.status {
            set_task_status(*task_id, status, &transaction)?;
        }
        if let Some(priority) = request.priority {
            transaction.execute(
                "UPDATE tasks SET priority = ?1, updated_at = ?2 WHERE id = ?3",
                params![priority, now, task_id],
            )?;
        }
        if let Some(due_date) = request.due_date {
            transaction.execute(
                "UPDATE tasks SET due_date = ?1, updated_at = ?2 WHERE id = ?3",
                params![due_date, now, task_id],
            )?;
        }
        updated += 1;
    }

    transaction.commit()?;
    tracing::info!(updated, "bulk updated tasks");

    Ok(BulkUpdateResult { updated })
}

pub fn delete_task(task_id: TaskID, db_connection: &Connection) -> InternalResult<()> {
    let deleted = db_connection.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

    if deleted == 0 {
        return Err(InternalError::NotFound(format!("Task {}", task_id)));
    }
    tracing::info!(task_id, "deleted task");

    Ok(())
}

pub fn filter_tasks(
    tasks: Vec<Task>,
    filter: Option<TaskFilter>,
    priority: Option<TaskPriority>,
    today: NaiveDate,
) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| match filter {
            None => true,
            Some(TaskFilter::ToDo) => task.status == TaskStatus::ToDo,
            Some(TaskFilter::InProgress) => task.status == TaskStatus::InProgress,
            Some(TaskFilter::Done) => task.status == TaskStatus::Done,
            Some(TaskFilter::Cancelled) => task.status == TaskStatus::Cancelled,
            Some(TaskFilter::Overdue) => task.is_overdue(today),
        })
        .filter(|task| priority.map_or(true, |priority| task.priority == priority))
        .collect()
}
