use rocket::fs::FileServer;
use rocket::{catchers, routes, Build, Rocket};

use std::error::Error;
use std::sync::{Arc, Mutex};

mod config;
mod dashboard;
mod data;
mod import;
mod internal_error;
mod inventory;
mod logging;
mod seeds;
mod tasks;
mod util;

use config::AppConfig;
use data::DBConnection;

fn build_rocket(rocket: Rocket<Build>, app_config: AppConfig, db_connection: DBConnection) -> Rocket<Build> {
    rocket
        .manage(db_connection)
        .manage(app_config)
        .mount(
            "/api",
            routes![
                dashboard::get_dashboard,
                dashboard::health,
                seeds::endpoints::get_seeds,
                seeds::endpoints::get_categories,
                seeds::endpoints::get_label_seeds,
                seeds::endpoints::get_seed_by_id,
                seeds::endpoints::update_seed,
                seeds::endpoints::remove_seed,
                tasks::endpoints::get_tasks,
                tasks::endpoints::get_task_metrics,
                tasks::endpoints::update_task_status,
                tasks::endpoints::bulk_update,
                tasks::endpoints::remove_task,
                inventory::endpoints::get_inventory_list,
                inventory::endpoints::get_adjustment_log,
                inventory::endpoints::update_inventory_record,
                inventory::endpoints::adjust,
                import::endpoints::preview_import,
                import::endpoints::import_seeds,
            ],
        )
        .register("/api", catchers![internal_error::json_catcher])
        .mount(
            "/",
            FileServer::from(concat!(env!("CARGO_MANIFEST_DIR"), "/web")).rank(15),
        )
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let figment = config::figment();
    let app_config: AppConfig = figment.extract()?;

    let _log_guard = logging::init_logging(&app_config)?;

    let connection = data::open_database(&app_config.database_path)?;
    let connection = Arc::new(Mutex::new(connection));

    tracing::info!(
        database_path = %app_config.database_path.display(),
        max_import_bytes = app_config.max_import_bytes,
        "starting seed library"
    );

    build_rocket(rocket::custom(figment), app_config, connection)
        .launch()
        .await?;

    Ok(())
}
