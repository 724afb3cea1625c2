use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::internal_error::{InternalError, InternalResult};
use crate::inventory::helpers::{ensure_inventory, get_adjustments, get_inventory};
use crate::tasks::generator::generate_tasks_for_seed;
use crate::tasks::helpers::get_tasks_for_seed;

use super::data::*;

const SEED_COLUMNS: &str = "id, type, name, packets_made, seed_source, date_ordered, date_finished, \
     date_cataloged, date_ran_out, amount_text, created_at, updated_at";

pub fn seed_from_row(row: &Row) -> rusqlite::Result<Seed> {
    Ok(Seed {
        id: row.get(0)?,
        seed_type: row.get(1)?,
        name: row.get(2)?,
        packets_made: row.get(3)?,
        seed_source: row.get(4)?,
        date_ordered: row.get(5)?,
        date_finished: row.get(6)?,
        date_cataloged: row.get(7)?,
        date_ran_out: row.get(8)?,
        amount_text: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub fn get_all_seeds(db_connection: &Connection) -> InternalResult<Vec<Seed>> {
    let mut statement = db_connection.prepare(&format!(
        "SELECT {} FROM seeds ORDER BY created_at DESC, id DESC",
        SEED_COLUMNS
    ))?;

    let seeds = statement
        .query_map([], seed_from_row)?
        .collect::<rusqlite::Result<Vec<Seed>>>()?;

    Ok(seeds)
}

pub fn get_seed(seed_id: SeedID, db_connection: &Connection) -> InternalResult<Option<Seed>> {
    let seed = db_connection
        .query_row(
            &format!("SELECT {} FROM seeds WHERE id = ?1", SEED_COLUMNS),
            params![seed_id],
            seed_from_row,
        )
        .optional()?;

    Ok(seed)
}

pub fn require_seed(seed_id: SeedID, db_connection: &Connection) -> InternalResult<Seed> {
    get_seed(seed_id, db_connection)?.ok_or_else(|| InternalError::NotFound(format!("Seed {}", seed_id)))
}

pub fn find_seed_by_name_and_type(
    name: &str,
    seed_type: &str,
    db_connection: &Connection,
) -> InternalResult<Option<Seed>> {
    let seed = db_connection
        .query_row(
            &format!(
                "SELECT {} FROM seeds WHERE name_key = ?1 AND type_key = ?2",
                SEED_COLUMNS
            ),
            params![identity_key(name), identity_key(seed_type)],
            seed_from_row,
        )
        .optional()?;

    Ok(seed)
}

pub fn insert_seed(fields: &SeedFields, db_connection: &Connection) -> InternalResult<Seed> {
    let now = Utc::now();

    db_connection.execute(
        "INSERT INTO seeds (type, name, packets_made, seed_source, date_ordered, date_finished, \
         date_cataloged, date_ran_out, amount_text, name_key, type_key, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
        params![
            fields.seed_type,
            fields.name,
            fields.packets_made,
            fields.seed_source,
            fields.date_ordered,
            fields.date_finished,
            fields.date_cataloged,
            fields.date_ran_out,
            fields.amount_text,
            identity_key(&fields.name),
            identity_key(&fields.seed_type),
            now,
        ],
    )?;
    let seed_id = db_connection.last_insert_rowid();
    tracing::info!(seed_id, name = %fields.name, "created seed");

    require_seed(seed_id, db_connection)
}

pub fn update_seed_fields(
    seed_id: SeedID,
    fields: &SeedFields,
    db_connection: &Connection,
) -> InternalResult<Seed> {
    if let Some(other) = find_seed_by_name_and_type(&fields.name, &fields.seed_type, db_connection)? {
        if other.id != seed_id {
            return Err(InternalError::Conflict(format!(
                "Seed '{}' of type '{}' already exists",
                other.name, other.seed_type
            )));
        }
    }

    let changed = db_connection.execute(
        "UPDATE seeds SET type = ?1, name = ?2, packets_made = ?3, seed_source = ?4, \
         date_ordered = ?5, date_finished = ?6, date_cataloged = ?7, date_ran_out = ?8, \
         amount_text = ?9, name_key = ?10, type_key = ?11, updated_at = ?12 WHERE id = ?13",
        params![
            fields.seed_type,
            fields.name,
            fields.packets_made,
            fields.seed_source,
            fields.date_ordered,
            fields.date_finished,
            fields.date_cataloged,
            fields.date_ran_out,
            fields.amount_text,
            identity_key(&fields.name),
            identity_key(&fields.seed_type),
            Utc::now(),
            seed_id,
        ],
    )?;

    if changed == 0 {
        return Err(InternalError::NotFound(format!("Seed {}", seed_id)));
    }
    tracing::info!(seed_id, "updated seed");

    require_seed(seed_id, db_connection)
}

/// Matches on name + type; re-imports overwrite the stored fields.
pub fn upsert_seed(
    fields: &SeedFields,
    db_connection: &Connection,
) -> InternalResult<(Seed, UpsertOutcome)> {
    match find_seed_by_name_and_type(&fields.name, &fields.seed_type, db_connection)? {
        Some(existing) => {
            let seed = update_seed_fields(existing.id, fields, db_connection)?;
            Ok((seed, UpsertOutcome::Updated))
        }
        None => {
            let seed = insert_seed(fields, db_connection)?;
            Ok((seed, UpsertOutcome::Created))
        }
    }
}

/// Edits a seed and regenerates its tasks in one transaction.
pub fn apply_seed_update(
    seed_id: SeedID,
    fields: &SeedFields,
    today: NaiveDate,
    db_connection: &Connection,
) -> InternalResult<SeedUpdateResult> {
    let transaction = db_connection.unchecked_transaction()?;

    let seed = update_seed_fields(seed_id, fields, &transaction)?;
    ensure_inventory(seed.id, &transaction)?;
    let generation = generate_tasks_for_seed(&seed, today, &transaction)?;

    transaction.commit()?;
    if !generation.is_empty() {
        tracing::info!(
            seed_id,
            created = generation.created.len(),
            updated = generation.updated.len(),
            cancelled = generation.cancelled.len(),
            "regenerated tasks after seed edit"
        );
    }

    Ok(SeedUpdateResult { seed, generation })
}

pub fn delete_seed(seed_id: SeedID, db_connection: &Connection) -> InternalResult<()> {
    let deleted = db_connection.execute("DELETE FROM seeds WHERE id = ?1", params![seed_id])?;

    if deleted == 0 {
        return Err(InternalError::NotFound(format!("Seed {}", seed_id)));
    }
    tracing::info!(seed_id, "deleted seed");

    Ok(())
}

pub fn get_seed_detail(seed_id: SeedID, db_connection: &Connection) -> InternalResult<SeedDetail> {
    let seed = require_seed(seed_id, db_connection)?;
    let tasks = get_tasks_for_seed(seed_id, db_connection)?;
    let inventory = get_inventory(seed_id, db_connection)?;
    let adjustments = get_adjustments(Some(seed_id), db_connection)?;

    Ok(SeedDetail {
        seed,
        tasks,
        inventory,
        adjustments,
    })
}

pub fn select_label_seeds(seed_ids: &[SeedID], db_connection: &Connection) -> InternalResult<Vec<Seed>> {
    if seed_ids.is_empty() {
        return Err(InternalError::Validation(
            "Please select at least one seed to print.".to_string(),
        ));
    }

    let mut selected = vec![];
    for seed_id in seed_ids {
        if let Some(seed) = get_seed(*seed_id, db_connection)? {
            selected.push(seed);
        }
    }

    if selected.is_empty() {
        return Err(InternalError::Validation("No valid seeds found for printing.".to_string()));
    }

    Ok(selected)
}

pub fn count_by_category(seeds: &[Seed]) -> CategoryCounts {
    let mut counts = CategoryCounts::new();

    for seed in seeds {
        let category = match seed.seed_type.trim() {
            "" => UNCATEGORIZED,
            category => category,
        };
        *counts.entry(category.to_string()).or_insert(0) += 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_connection;
    use crate::tasks::data::{TaskStatus, TaskType};

    fn fields(name: &str, seed_type: &str) -> SeedFields {
        SeedFields {
            seed_type: seed_type.to_string(),
            name: name.to_string(),
            ..SeedFields::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn upsert_matches_on_name_and_type_case_insensitively() {
        let connection = test_connection();

        let (first, outcome) = upsert_seed(&fields("Basil", "Herb"), &connection).unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);

        let mut changed = fields("basil ", "HERB");
        changed.packets_made = 12;
        let (second, outcome) = upsert_seed(&changed, &connection).unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(second.id, first.id);
        assert_eq!(second.packets_made, 12);
        assert_eq!(get_all_seeds(&connection).unwrap().len(), 1);
    }

    #[test]
    fn upsert_folds_non_ascii_case() {
        let connection = test_connection();

        let (first, _) = upsert_seed(&fields("Jalapeño", "Pepper"), &connection).unwrap();
        let (second, outcome) = upsert_seed(&fields("JALAPEÑO", "PEPPER"), &connection).unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(second.id, first.id);
        assert_eq!(get_all_seeds(&connection).unwrap().len(), 1);
    }

    #[test]
    fn renaming_onto_an_existing_seed_conflicts() {
        let connection = test_connection();
        insert_seed(&fields("Basil", "Herb"), &connection).unwrap();
        let dill = insert_seed(&fields("Dill", "Herb"), &connection).unwrap();

        let result = apply_seed_update(dill.id, &fields(" basil", "herb"), today(), &connection);

        assert!(matches!(result, Err(InternalError::Conflict(_))));
        assert_eq!(require_seed(dill.id, &connection).unwrap().name, "Dill");
    }

    #[test]
    fn inserting_a_duplicate_identity_conflicts() {
        let connection = test_connection();
        insert_seed(&fields("Basil", "Herb"), &connection).unwrap();

        let result = insert_seed(&fields("BASIL", "Herb"), &connection);

        assert!(matches!(result, Err(InternalError::Conflict(_))));
    }

    #[test]
    fn reading_detail_does_not_create_inventory() {
        let connection = test_connection();
        let seed = insert_seed(&fields("Basil", "Herb"), &connection).unwrap();

        let detail = get_seed_detail(seed.id, &connection).unwrap();

        assert!(detail.inventory.is_none());
        let rows: i64 = connection
            .query_row("SELECT COUNT(*) FROM inventory", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn same_name_different_type_is_a_different_seed() {
        let connection = test_connection();

        upsert_seed(&fields("Sage", "Herb"), &connection).unwrap();
        let (_, outcome) = upsert_seed(&fields("Sage", "Flower"), &connection).unwrap();

        assert_eq!(outcome, UpsertOutcome::Created);
        assert_eq!(get_all_seeds(&connection).unwrap().len(), 2);
    }

    #[test]
    fn missing_seed_is_not_found() {
        let connection = test_connection();

        assert!(matches!(require_seed(42, &connection), Err(InternalError::NotFound(_))));
        assert!(matches!(delete_seed(42, &connection), Err(InternalError::NotFound(_))));
        assert!(matches!(
            update_seed_fields(42, &fields("Basil", "Herb"), &connection),
            Err(InternalError::NotFound(_))
        ));
    }

    #[test]
    fn finishing_a_seed_swaps_pack_for_catalog() {
        let connection = test_connection();
        let seed = insert_seed(&fields("Basil", "Herb"), &connection).unwrap();
        apply_seed_update(seed.id, &fields("Basil", "Herb"), today(), &connection).unwrap();

        let mut finished = fields("Basil", "Herb");
        finished.date_finished = Some(today());
        let result = apply_seed_update(seed.id, &finished, today(), &connection).unwrap();

        assert_eq!(result.generation.created.len(), 1);
        assert_eq!(result.generation.cancelled.len(), 1);

        let detail = get_seed_detail(seed.id, &connection).unwrap();
        let open: Vec<TaskType> = detail
            .tasks
            .iter()
            .filter(|task| task.status.is_open())
            .map(|task| task.task_type)
            .collect();
        assert_eq!(open, vec![TaskType::Catalog]);
        assert!(detail
            .tasks
            .iter()
            .any(|task| task.task_type == TaskType::Pack && task.status == TaskStatus::Cancelled));
    }

    #[test]
    fn delete_removes_the_seed_and_its_tasks() {
        let connection = test_connection();
        let seed = insert_seed(&fields("Basil", "Herb"), &connection).unwrap();
        apply_seed_update(seed.id, &fields("Basil", "Herb"), today(), &connection).unwrap();

        delete_seed(seed.id, &connection).unwrap();

        assert!(get_seed(seed.id, &connection).unwrap().is_none());
        assert!(get_tasks_for_seed(seed.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn label_selection_keeps_order_and_skips_unknown_ids() {
        let connection = test_connection();
        let basil = insert_seed(&fields("Basil", "Herb"), &connection).unwrap();
        let dill = insert_seed(&fields("Dill", "Herb"), &connection).unwrap();

        let selected = select_label_seeds(&[dill.id, 999, basil.id], &connection).unwrap();

        let names: Vec<&str> = selected.iter().map(|seed| seed.name.as_str()).collect();
        assert_eq!(names, vec!["Dill", "Basil"]);
    }

    #[test]
    fn label_selection_needs_a_known_seed() {
        let connection = test_connection();

        match select_label_seeds(&[], &connection) {
            Err(InternalError::Validation(message)) => {
                assert_eq!(message, "Please select at least one seed to print.")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        match select_label_seeds(&[7, 8], &connection) {
            Err(InternalError::Validation(message)) => assert_eq!(message, "No valid seeds found for printing."),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn categories_count_blank_types_as_uncategorized() {
        let connection = test_connection();
        insert_seed(&fields("Basil", "Herb"), &connection).unwrap();
        insert_seed(&fields("Dill", "Herb"), &connection).unwrap();
        insert_seed(&fields("Zinnia", "Flower"), &connection).unwrap();
        insert_seed(&fields("Mystery", "  "), &connection).unwrap();

        let counts = count_by_category(&get_all_seeds(&connection).unwrap());

        assert_eq!(counts.get("Herb"), Some(&2));
        assert_eq!(counts.get("Flower"), Some(&1));
        assert_eq!(counts.get(UNCATEGORIZED), Some(&1));
    }
}
