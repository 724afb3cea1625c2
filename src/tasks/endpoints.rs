use rocket::serde::json::Json;
use rocket::{delete, get, post, State};

use crate::data::DBConnection;
use crate::internal_error::InternalResult;
use crate::util::today;

use super::data::*;
use super::helpers::*;
use super::metrics::{calculate_task_metrics, TaskMetrics};

#[get("/tasks?<filter>&<priority>")]
pub fn get_tasks(
    filter: Option<&str>,
    priority: Option<&str>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Vec<Task>>> {
    let filter = filter.map(str::parse::<TaskFilter>).transpose()?;
    let priority = priority.map(str::parse::<TaskPriority>).transpose()?;
    let db_connection = db_connection.lock()?;

    let tasks = get_all_tasks(&db_connection)?;

    Ok(Json(filter_tasks(tasks, filter, priority, today())))
}

#[get("/tasks/metrics")]
pub fn get_task_metrics(db_connection: &State<DBConnection>) -> InternalResult<Json<TaskMetrics>> {
    let db_connection = db_connection.lock()?;
    calculate_task_metrics(today(), &db_connection).map(Json)
}

#[post("/tasks/<task_id>/status", format = "json", data = "<status_request>")]
pub fn update_task_status(
    task_id: TaskID,
    status_request: Json<UpdateStatusRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Task>> {
    let db_connection = db_connection.lock()?;
    set_task_status(task_id, status_request.status, &db_connection).map(Json)
}

#[post("/tasks/bulk", format = "json", data = "<bulk_request>")]
pub fn bulk_update(
    bulk_request: Json<BulkUpdateRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<BulkUpdateResult>> {
    let db_connection = db_connection.lock()?;
    bulk_update_tasks(&bulk_request, &db_connection).map(Json)
}

#[delete("/tasks/<task_id>")]
pub fn remove_task(task_id: TaskID, db_connection: &State<DBConnection>) -> InternalResult<()> {
    let db_connection = db_connection.lock()?;

    delete_task(task_id, &db_connection)?;

    Ok(())
}
