use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::internal_error::{InternalError, InternalResult};
use crate::seeds::data::SeedID;
use crate::seeds::helpers::require_seed;

use super::data::*;

const INVENTORY_SELECT: &str = "SELECT inventory.id, inventory.seed_id, inventory.current_amount, \
     inventory.buy_more, inventory.extra, inventory.notes, inventory.last_updated, seeds.name, seeds.type \
     FROM inventory LEFT JOIN seeds ON seeds.id = inventory.seed_id";

const ADJUSTMENT_SELECT: &str = "SELECT inventory_adjustments.id, inventory_adjustments.seed_id, \
     inventory_adjustments.adjustment_type, inventory_adjustments.amount_change, \
     inventory_adjustments.reason, inventory_adjustments.adjusted_at, seeds.name \
     FROM inventory_adjustments LEFT JOIN seeds ON seeds.id = inventory_adjustments.seed_id";

fn inventory_from_row(row: &Row) -> rusqlite::Result<Inventory> {
    Ok(Inventory {
        id: row.get(0)?,
        seed_id: row.get(1)?,
        current_amount: row.get(2)?,
        buy_more: row.get(3)?,
        extra: row.get(4)?,
        notes: row.get(5)?,
        last_updated: row.get(6)?,
        seed_name: row.get(7)?,
        seed_type: row.get(8)?,
    })
}

fn adjustment_from_row(row: &Row) -> rusqlite::Result<InventoryAdjustment> {
    Ok(InventoryAdjustment {
        id: row.get(0)?,
        seed_id: row.get(1)?,
        adjustment_type: row.get(2)?,
        amount_change: row.get(3)?,
        reason: row.get(4)?,
        adjusted_at: row.get(5)?,
        seed_name: row.get(6)?,
    })
}

/// Inserts an empty snapshot for the seed unless one already exists.
pub fn ensure_inventory(seed_id: SeedID, db_connection: &Connection) -> InternalResult<()> {
    db_connection.execute(
        "INSERT OR IGNORE INTO inventory (seed_id, last_updated) VALUES (?1, ?2)",
        params![seed_id, Utc::now()],
    )?;
    Ok(())
}

pub fn get_inventory(seed_id: SeedID, db_connection: &Connection) -> InternalResult<Option<Inventory>> {
    let inventory = db_connection
        .query_row(
            &format!("{} WHERE inventory.seed_id = ?1", INVENTORY_SELECT),
            params![seed_id],
            inventory_from_row,
        )
        .optional()?;

    Ok(inventory)
}

pub fn get_or_create_inventory(seed_id: SeedID, db_connection: &Connection) -> InternalResult<Inventory> {
    if let Some(inventory) = get_inventory(seed_id, db_connection)? {
        return Ok(inventory);
    }

    require_seed(seed_id, db_connection)?;
    ensure_inventory(seed_id, db_connection)?;

    get_inventory(seed_id, db_connection)?
        .ok_or_else(|| InternalError::Internal(format!("inventory for seed {} was not created", seed_id)))
}

pub fn get_all_inventory(
    filter: Option<InventoryFilter>,
    db_connection: &Connection,
) -> InternalResult<Vec<Inventory>> {
    let condition = match filter {
        None => "",
        Some(InventoryFilter::BuyMore) => " WHERE inventory.buy_more = 1",
        Some(InventoryFilter::Extra) => " WHERE inventory.extra = 1",
    };
    let mut statement = db_connection.prepare(&format!(
        "{}{} ORDER BY seeds.name COLLATE NOCASE, inventory.id",
        INVENTORY_SELECT, condition
    ))?;

    let items = statement
        .query_map([], inventory_from_row)?
        .collect::<rusqlite::Result<Vec<Inventory>>>()?;

    Ok(items)
}

/// Newest first.
pub fn get_adjustments(
    seed_id: Option<SeedID>,
    db_connection: &Connection,
) -> InternalResult<Vec<InventoryAdjustment>> {
    let adjustments = match seed_id {
        Some(seed_id) => {
            let mut statement = db_connection.prepare(&format!(
                "{} WHERE inventory_adjustments.seed_id = ?1 \
                 ORDER BY inventory_adjustments.adjusted_at DESC, inventory_adjustments.id DESC",
                ADJUSTMENT_SELECT
            ))?;
            let rows = statement.query_map(params![seed_id], adjustment_from_row)?;
            rows.collect::<rusqlite::Result<Vec<InventoryAdjustment>>>()?
        }
        None => {
            let mut statement = db_connection.prepare(&format!(
                "{} ORDER BY inventory_adjustments.adjusted_at DESC, inventory_adjustments.id DESC",
                ADJUSTMENT_SELECT
            ))?;
            let rows = statement.query_map([], adjustment_from_row)?;
            rows.collect::<rusqlite::Result<Vec<InventoryAdjustment>>>()?
        }
    };

    Ok(adjustments)
}

/// Returns the amount after applying `amount_change`, or why it cannot be applied.
pub fn validate_amount_change(current_amount: f64, amount_change: f64) -> InternalResult<f64> {
    if !amount_change.is_finite() {
        return Err(InternalError::Validation("amount_change must be a finite number".to_string()));
    }
    if amount_change == 0.0 {
        return Err(InternalError::Validation("amount_change must not be zero".to_string()));
    }

    let new_amount = current_amount + amount_change;
    if new_amount < 0.0 {
        return Err(InternalError::Validation(format!(
            "amount_change of {} would leave {} below zero",
            amount_change, current_amount
        )));
    }

    Ok(new_amount)
}

/// Appends to the adjustment log and moves the snapshot by the same amount.
/// Must run inside the caller's transaction.
pub fn adjust_inventory(
    seed_id: SeedID,
    request: &AdjustRequest,
    db_connection: &Connection,
) -> InternalResult<AdjustmentResult> {
    let inventory = get_or_create_inventory(seed_id, db_connection)?;
    let new_amount = validate_amount_change(inventory.current_amount, request.amount_change)?;
    let now = Utc::now();

    db_connection.execute(
        "INSERT INTO inventory_adjustments (seed_id, adjustment_type, amount_change, reason, adjusted_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            seed_id,
            request.adjustment_type,
            request.amount_change,
            request.reason.trim(),
            now
        ],
    )?;
    let adjustment_id = db_connection.last_insert_rowid();

    db_connection.execute(
        "UPDATE inventory SET current_amount = ?1, last_updated = ?2 WHERE seed_id = ?3",
        params![new_amount, now, seed_id],
    )?;
    tracing::info!(
        seed_id,
        adjustment_id,
        amount_change = request.amount_change,
        current_amount = new_amount,
        "adjusted inventory"
    );

    let adjustment = db_connection.query_row(
        &format!("{} WHERE inventory_adjustments.id = ?1", ADJUSTMENT_SELECT),
        params![adjustment_id],
        adjustment_from_row,
    )?;

    Ok(AdjustmentResult {
        inventory: get_or_create_inventory(seed_id, db_connection)?,
        adjustment,
    })
}

/// Flags and notes are written as given. A new absolute amount is recorded as a
/// Correction for the difference so the log still sums to the snapshot.
/// Must run inside the caller's transaction.
pub fn update_inventory(
    seed_id: SeedID,
    request: &InventoryUpdateRequest,
    db_connection: &Connection,
) -> InternalResult<Inventory> {
    let inventory = get_or_create_inventory(seed_id, db_connection)?;

    if let Some(target) = request.current_amount {
        if !target.is_finite() || target < 0.0 {
            return Err(InternalError::Validation(
                "current_amount must be a non-negative number".to_string(),
            ));
        }

        let delta = target - inventory.current_amount;
        if delta != 0.0 {
            adjust_inventory(
                seed_id,
                &AdjustRequest {
                    adjustment_type: AdjustmentType::Correction,
                    amount_change: delta,
                    reason: format!("Set from {} to {}", inventory.current_amount, target),
                },
                db_connection,
            )?;
        }
    }

    let buy_more = request.buy_more.unwrap_or(inventory.buy_more);
    let extra = request.extra.unwrap_or(inventory.extra);
    let notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .unwrap_or(inventory.notes.as_str())
        .to_string();

    db_connection.execute(
        "UPDATE inventory SET buy_more = ?1, extra = ?2, notes = ?3, last_updated = ?4 WHERE seed_id = ?5",
        params![buy_more, extra, notes, Utc::now(), seed_id],
    )?;
    tracing::info!(seed_id, buy_more, extra, "updated inventory");

    get_or_create_inventory(seed_id, db_connection)
}
