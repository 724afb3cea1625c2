use chrono::{DateTime, NaiveDate, Utc};
use rocket::serde::json::Json;
use rocket::{get, State};
use rusqlite::Connection;
use serde::Serialize;

use crate::data::DBConnection;
use crate::internal_error::InternalResult;
use crate::seeds::data::CategoryCounts;
use crate::seeds::helpers::{count_by_category, get_all_seeds};
use crate::tasks::data::Task;
use crate::tasks::helpers::get_all_tasks;
use crate::tasks::metrics::{compute_metrics, TaskMetrics};
use crate::util::today;

pub const RECENT_TASK_COUNT: usize = 10;

#[derive(Serialize, Debug)]
pub struct DashboardData {
    pub metrics: TaskMetrics,
    pub seeds_count: usize,
    pub category_counts: CategoryCounts,
    pub recent_tasks: Vec<Task>,
}

#[derive(Serialize, Debug)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub fn build_dashboard(today: NaiveDate, db_connection: &Connection) -> InternalResult<DashboardData> {
    let seeds = get_all_seeds(db_connection)?;
    let tasks = get_all_tasks(db_connection)?;

    Ok(DashboardData {
        metrics: compute_metrics(&tasks, today),
        seeds_count: seeds.len(),
        category_counts: count_by_category(&seeds),
        // get_all_tasks is newest first
        recent_tasks: tasks.into_iter().take(RECENT_TASK_COUNT).collect(),
    })
}

#[get("/dashboard")]
pub fn get_dashboard(db_connection: &State<DBConnection>) -> InternalResult<Json<DashboardData>> {
    let db_connection = db_connection.lock()?;
    build_dashboard(today(), &db_connection).map(Json)
}

#[get("/health")]
pub fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        timestamp: Utc::now(),
    })
}
