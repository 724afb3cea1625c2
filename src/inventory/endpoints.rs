use rocket::serde::json::Json;
use rocket::{get, post, State};

use crate::data::DBConnection;
use crate::internal_error::InternalResult;
use crate::seeds::data::SeedID;

use super::data::*;
use super::helpers::*;

#[get("/inventory?<filter>")]
pub fn get_inventory_list(
    filter: Option<&str>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Vec<Inventory>>> {
    let filter = filter.map(str::parse::<InventoryFilter>).transpose()?;
    let db_connection = db_connection.lock()?;

    let inventory = get_all_inventory(filter, &db_connection)?;

    Ok(Json(inventory))
}

#[get("/inventory/adjustments?<seed_id>")]
pub fn get_adjustment_log(
    seed_id: Option<SeedID>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Vec<InventoryAdjustment>>> {
    let db_connection = db_connection.lock()?;
    get_adjustments(seed_id, &db_connection).map(Json)
}

#[post("/inventory/<seed_id>", format = "json", data = "<update_request>")]
pub fn update_inventory_record(
    seed_id: SeedID,
    update_request: Json<InventoryUpdateRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Inventory>> {
    let db_connection = db_connection.lock()?;
    let transaction = db_connection.unchecked_transaction()?;

    let inventory = update_inventory(seed_id, &update_request, &transaction)?;
    transaction.commit()?;

    Ok(Json(inventory))
}

#[post("/inventory/<seed_id>/adjust", format = "json", data = "<adjust_request>")]
pub fn adjust(
    seed_id: SeedID,
    adjust_request: Json<AdjustRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<AdjustmentResult>> {
    let db_connection = db_connection.lock()?;
    let transaction = db_connection.unchecked_transaction()?;

    let result = adjust_inventory(seed_id, &adjust_request, &transaction)?;
    transaction.commit()?;

    Ok(Json(result))
}
