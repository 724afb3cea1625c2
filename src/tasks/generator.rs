//! Derives follow-up tasks from a seed's lifecycle dates.
//!
//! [`plan_tasks`] is the pure rule set; [`generate_tasks_for_seed`] reconciles
//! the plan with what is stored. At most one non-cancelled task exists per
//! (seed, task type). Open tasks whose type drops out of the plan are
//! cancelled; done tasks are never touched.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use crate::internal_error::{InternalError, InternalResult};
use crate::seeds::data::Seed;

use super::data::*;
use super::helpers::{get_tasks_for_seed, insert_task, set_task_description, set_task_status};

pub const PACK_DUE_DAYS: i64 = 7;
pub const CATALOG_DUE_DAYS: i64 = 3;
pub const REORDER_DUE_DAYS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    pub task_type: TaskType,
    pub due_date: NaiveDate,
    pub description: String,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub created: Vec<TaskID>,
    pub updated: Vec<TaskID>,
    pub cancelled: Vec<TaskID>,
}

impl GenerationSummary {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.cancelled.is_empty()
    }
}

pub fn plan_tasks(seed: &Seed, today: NaiveDate) -> Vec<PlannedTask> {
    let mut planned = vec![];

    match (seed.date_finished, seed.date_cataloged) {
        (None, _) => planned.push(PlannedTask {
            task_type: TaskType::Pack,
            due_date: today + Duration::days(PACK_DUE_DAYS),
            description: format!("Pack {} into packets", seed.name),
        }),
        (Some(_), None) => planned.push(PlannedTask {
            task_type: TaskType::Catalog,
            due_date: today + Duration::days(CATALOG_DUE_DAYS),
            description: format!("Catalog {} in the system", seed.name),
        }),
        (Some(_), Some(_)) => {}
    }

    if seed.date_ran_out.is_some() {
        let source = match seed.seed_source.trim() {
            "" => "supplier",
            source => source,
        };
        planned.push(PlannedTask {
            task_type: TaskType::Reorder,
            due_date: today + Duration::days(REORDER_DUE_DAYS),
            description: format!("Reorder {} from {}", seed.name, source),
        });
    }

    planned
}

/// Must run inside the caller's transaction.
pub fn generate_tasks_for_seed(
    seed: &Seed,
    today: NaiveDate,
    db_connection: &Connection,
) -> InternalResult<GenerationSummary> {
    let planned = plan_tasks(seed, today);
    let existing = get_tasks_for_seed(seed.id, db_connection)?;
    let mut summary = GenerationSummary::default();

    for task_type in TaskType::ALL {
        let wanted = planned.iter().find(|plan| plan.task_type == task_type);
        let current = existing
            .iter()
            .find(|task| task.task_type == task_type && task.status != TaskStatus::Cancelled);

        match (wanted, current) {
            (Some(plan), None) => {
                let new_task = NewTask {
                    seed_id: seed.id,
                    task_type,
                    due_date: plan.due_date,
                    description: plan.description.clone(),
                };
                match insert_task(&new_task, db_connection) {
                    Ok(task_id) => {
                        tracing::info!(task_id, seed_id = seed.id, task_type = task_type.as_str(), "created task");
                        summary.created.push(task_id);
                    }
                    Err(InternalError::Conflict(reason)) => {
                        tracing::debug!(seed_id = seed.id, task_type = task_type.as_str(), %reason, "task already exists");
                    }
                    Err(e) => return Err(e),
                }
            }
            (Some(plan), Some(task)) if task.status.is_open() && task.description != plan.description => {
                set_task_description(task.id, &plan.description, db_connection)?;
                summary.updated.push(task.id);
            }
            (None, Some(task)) if task.status.is_open() => {
                set_task_status(task.id, TaskStatus::Cancelled, db_connection)?;
                tracing::info!(task_id = task.id, seed_id = seed.id, task_type = task_type.as_str(), "cancelled obsolete task");
                summary.cancelled.push(task.id);
            }
            _ => {}
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_connection;
    use crate::seeds::data::SeedFields;
    use crate::seeds::helpers::{insert_seed, update_seed_fields};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn basil() -> SeedFields {
        SeedFields {
            seed_type: "Herb".to_string(),
            name: "Basil".to_string(),
            seed_source: "Baker Creek".to_string(),
            ..SeedFields::default()
        }
    }

    fn open_tasks(seed: &Seed, connection: &Connection) -> Vec<(TaskType, Option<NaiveDate>)> {
        let mut open: Vec<(TaskType, Option<NaiveDate>)> = get_tasks_for_seed(seed.id, connection)
            .unwrap()
            .into_iter()
            .filter(|task| task.status.is_open())
            .map(|task| (task.task_type, task.due_date))
            .collect();
        open.sort();
        open
    }

    #[test]
    fn unfinished_seed_plans_a_pack_task_a_week_out() {
        let connection = test_connection();
        let seed = insert_seed(&basil(), &connection).unwrap();

        let planned = plan_tasks(&seed, today());

        assert_eq!(
            planned,
            vec![PlannedTask {
                task_type: TaskType::Pack,
                due_date: NaiveDate::from_ymd_opt(2024, 6, 8).unwrap(),
                description: "Pack Basil into packets".to_string(),
            }]
        );
    }

    #[test]
    fn finished_uncataloged_seed_plans_catalog_and_reorder() {
        let connection = test_connection();
        let mut fields = basil();
        fields.date_finished = Some(today());
        fields.date_ran_out = Some(today());
        let seed = insert_seed(&fields, &connection).unwrap();

        let planned = plan_tasks(&seed, today());

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].task_type, TaskType::Catalog);
        assert_eq!(planned[0].due_date, NaiveDate::from_ymd_opt(2024, 6, 4).unwrap());
        assert_eq!(planned[1].task_type, TaskType::Reorder);
        assert_eq!(planned[1].due_date, NaiveDate::from_ymd_opt(2024, 6, 6).unwrap());
        assert_eq!(planned[1].description, "Reorder Basil from Baker Creek");
    }

    #[test]
    fn cataloged_seed_plans_nothing() {
        let connection = test_connection();
        let mut fields = basil();
        fields.date_finished = Some(today());
        fields.date_cataloged = Some(today());
        let seed = insert_seed(&fields, &connection).unwrap();

        assert!(plan_tasks(&seed, today()).is_empty());
    }

    #[test]
    fn reorder_without_source_names_the_supplier() {
        let connection = test_connection();
        let mut fields = basil();
        fields.seed_source = String::new();
        fields.date_ran_out = Some(today());
        let seed = insert_seed(&fields, &connection).unwrap();

        let planned = plan_tasks(&seed, today());
        let reorder = planned.iter().find(|plan| plan.task_type == TaskType::Reorder).unwrap();

        assert_eq!(reorder.description, "Reorder Basil from supplier");
    }

    #[test]
    fn generation_is_idempotent() {
        let connection = test_connection();
        let mut fields = basil();
        fields.date_ran_out = Some(today());
        let seed = insert_seed(&fields, &connection).unwrap();

        let first = generate_tasks_for_seed(&seed, today(), &connection).unwrap();
        let before = open_tasks(&seed, &connection);
        let later = today() + Duration::days(2);
        let second = generate_tasks_for_seed(&seed, later, &connection).unwrap();

        assert_eq!(first.created.len(), 2);
        assert!(second.is_empty());
        assert_eq!(open_tasks(&seed, &connection), before);
        assert_eq!(get_tasks_for_seed(seed.id, &connection).unwrap().len(), 2);
    }

    #[test]
    fn finishing_cancels_pack_and_opens_catalog() {
        let connection = test_connection();
        let seed = insert_seed(&basil(), &connection).unwrap();
        generate_tasks_for_seed(&seed, today(), &connection).unwrap();

        let mut fields = basil();
        fields.date_finished = Some(today());
        let seed = update_seed_fields(seed.id, &fields, &connection).unwrap();
        let summary = generate_tasks_for_seed(&seed, today(), &connection).unwrap();

        assert_eq!(summary.created.len(), 1);
        assert_eq!(summary.cancelled.len(), 1);
        assert_eq!(
            open_tasks(&seed, &connection),
            vec![(TaskType::Catalog, Some(NaiveDate::from_ymd_opt(2024, 6, 4).unwrap()))]
        );
    }

    #[test]
    fn cataloging_cancels_the_catalog_task() {
        let connection = test_connection();
        let mut fields = basil();
        fields.date_finished = Some(today());
        let seed = insert_seed(&fields, &connection).unwrap();
        generate_tasks_for_seed(&seed, today(), &connection).unwrap();

        fields.date_cataloged = Some(today());
        let seed = update_seed_fields(seed.id, &fields, &connection).unwrap();
        let summary = generate_tasks_for_seed(&seed, today(), &connection).unwrap();

        assert_eq!(summary.cancelled.len(), 1);
        assert!(open_tasks(&seed, &connection).is_empty());
    }

    #[test]
    fn done_tasks_are_neither_recreated_nor_cancelled() {
        let connection = test_connection();
        let seed = insert_seed(&basil(), &connection).unwrap();
        let summary = generate_tasks_for_seed(&seed, today(), &connection).unwrap();
        set_task_status(summary.created[0], TaskStatus::Done, &connection).unwrap();

        let again = generate_tasks_for_seed(&seed, today(), &connection).unwrap();
        assert!(again.is_empty());

        let mut fields = basil();
        fields.date_finished = Some(today());
        let seed = update_seed_fields(seed.id, &fields, &connection).unwrap();
        let after_finish = generate_tasks_for_seed(&seed, today(), &connection).unwrap();

        assert!(after_finish.cancelled.is_empty());
        let tasks = get_tasks_for_seed(seed.id, &connection).unwrap();
        let pack = tasks.iter().find(|task| task.task_type == TaskType::Pack).unwrap();
        assert_eq!(pack.status, TaskStatus::Done);
    }

    #[test]
    fn renaming_refreshes_open_task_description() {
        let connection = test_connection();
        let seed = insert_seed(&basil(), &connection).unwrap();
        let created = generate_tasks_for_seed(&seed, today(), &connection).unwrap();

        let mut fields = basil();
        fields.name = "Thai Basil".to_string();
        let seed = update_seed_fields(seed.id, &fields, &connection).unwrap();
        let summary = generate_tasks_for_seed(&seed, today() + Duration::days(1), &connection).unwrap();

        assert_eq!(summary.updated, created.created);
        let tasks = get_tasks_for_seed(seed.id, &connection).unwrap();
        assert_eq!(tasks[0].description, "Pack Thai Basil into packets");
        // Due date stays anchored to when the task was first generated.
        assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2024, 6, 8));
    }

    #[test]
    fn clearing_ran_out_cancels_reorder() {
        let connection = test_connection();
        let mut fields = basil();
        fields.date_ran_out = Some(today());
        let seed = insert_seed(&fields, &connection).unwrap();
        generate_tasks_for_seed(&seed, today(), &connection).unwrap();

        fields.date_ran_out = None;
        let seed = update_seed_fields(seed.id, &fields, &connection).unwrap();
        let summary = generate_tasks_for_seed(&seed, today(), &connection).unwrap();

        assert_eq!(summary.cancelled.len(), 1);
        assert_eq!(open_tasks(&seed, &connection), vec![(TaskType::Pack, NaiveDate::from_ymd_opt(2024, 6, 8))]);
    }
}
