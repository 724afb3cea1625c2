use rocket::data::{Data, ToByteUnit};
use rocket::serde::json::Json;
use rocket::{post, State};

use crate::config::AppConfig;
use crate::data::DBConnection;
use crate::internal_error::{InternalError, InternalResult};
use crate::util::today;

use super::data::*;
use super::helpers::*;
use super::sheet::{check_file_name, read_workbook, Sheet};

/// Reads the upload up to the configured limit and parses its first worksheet.
async fn read_upload(file_name: &str, data: Data<'_>, config: &AppConfig) -> InternalResult<Sheet> {
    check_file_name(file_name)?;

    let bytes = data.open(config.max_import_bytes.bytes()).into_bytes().await?;
    if !bytes.is_complete() {
        tracing::warn!(file_name, limit = config.max_import_bytes, "rejected oversized upload");
        return Err(InternalError::TooLarge {
            limit: config.max_import_bytes,
        });
    }

    read_workbook(bytes.into_inner())
}

#[post("/import/preview/<file_name>?<overrides..>", data = "<data>")]
pub async fn preview_import(
    file_name: &str,
    overrides: ColumnOverrides,
    data: Data<'_>,
    config: &State<AppConfig>,
) -> InternalResult<Json<ImportPreview>> {
    let sheet = read_upload(file_name, data, config).await?;

    Ok(Json(preview_sheet(file_name, &sheet, &overrides)))
}

#[post("/import/<file_name>?<overrides..>", data = "<data>")]
pub async fn import_seeds(
    file_name: &str,
    overrides: ColumnOverrides,
    data: Data<'_>,
    config: &State<AppConfig>,
    db_connection: &State<DBConnection>,
) -> InternalResult<Json<ImportReport>> {
    let sheet = read_upload(file_name, data, config).await?;

    let db_connection = db_connection.lock()?;
    import_with_overrides(file_name, &sheet, &overrides, today(), &db_connection).map(Json)
}
