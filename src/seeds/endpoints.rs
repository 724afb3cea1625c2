use rocket::serde::json::Json;
use rocket::{delete, get, post, State};

use crate::data::DBConnection;
use crate::internal_error::InternalResult;
use crate::util::today;

use super::data::*;
use super::helpers::*;

#[get("/seeds")]
pub fn get_seeds(db_connection: &State<DBConnection>) -> InternalResult<Json<Vec<Seed>>> {
    let db_connection = db_connection.lock()?;

    let seeds = get_all_seeds(&db_connection)?;

    Ok(Json(seeds))
}

#[get("/seeds/categories")]
pub fn get_categories(db_connection: &State<DBConnection>) -> InternalResult<Json<CategoryCounts>> {
    let db_connection = db_connection.lock()?;

    let seeds = get_all_seeds(&db_connection)?;

    Ok(Json(count_by_category(&seeds)))
}

#[post("/seeds/labels", format = "json", data = "<label_request>")]
pub fn get_label_seeds(
    label_request: Json<LabelRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<Vec<Seed>>> {
    let db_connection = db_connection.lock()?;
    select_label_seeds(&label_request.seed_ids, &db_connection).map(Json)
}

#[get("/seeds/<seed_id>")]
pub fn get_seed_by_id(seed_id: SeedID, db_connection: &State<DBConnection>) -> InternalResult<Json<SeedDetail>> {
    let db_connection = db_connection.lock()?;
    get_seed_detail(seed_id, &db_connection).map(Json)
}

#[post("/seeds/<seed_id>", format = "json", data = "<update_request>")]
pub fn update_seed(
    seed_id: SeedID,
    update_request: Json<SeedUpdateRequest>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<SeedUpdateResult>> {
    let fields = update_request.into_inner().into_fields()?;
    let db_connection = db_connection.lock()?;

    apply_seed_update(seed_id, &fields, today(), &db_connection).map(Json)
}

#[delete("/seeds/<seed_id>")]
pub fn remove_seed(seed_id: SeedID, db_connection: &State<DBConnection>) -> InternalResult<()> {
    let db_connection = db_connection.lock()?;

    delete_seed(seed_id, &db_connection)?;

    Ok(())
}
