use chrono::NaiveDate;
use rusqlite::Connection;

use crate::internal_error::{InternalError, InternalResult};
use crate::inventory::helpers::ensure_inventory;
use crate::seeds::data::{SeedFields, UpsertOutcome};
use crate::seeds::helpers::upsert_seed;
use crate::tasks::generator::generate_tasks_for_seed;
use crate::util::parse_date_text;

use super::columns::{build_mapping, ColumnMapping, SeedField};
use super::data::*;
use super::sheet::{Cell, Sheet};

/// Spreadsheet row number of the data row at `index` (header is row 1).
fn row_number(index: usize) -> usize {
    index + 2
}

fn field_cell<'a>(row: &'a [Cell], mapping: &ColumnMapping, field: SeedField) -> &'a Cell {
    mapping
        .column(field)
        .and_then(|column| row.get(column))
        .unwrap_or(&Cell::Empty)
}

fn date_from_cell(cell: &Cell) -> Result<Option<NaiveDate>, String> {
    match cell {
        Cell::Date(date) => Ok(Some(*date)),
        cell if cell.is_blank() => Ok(None),
        Cell::Text(text) => parse_date_text(text)
            .map(Some)
            .ok_or_else(|| format!("'{}' is not a date", text.trim())),
        other => Err(format!("'{}' is not a date", other.as_text())),
    }
}

fn packets_from_cell(cell: &Cell) -> Result<i64, String> {
    let number = match cell {
        cell if cell.is_blank() => return Ok(0),
        Cell::Number(number) => Some(*number),
        Cell::Text(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(number) if number >= 0.0 && number.fract() == 0.0 && number < i64::MAX as f64 => Ok(number as i64),
        _ => Err(format!("'{}' is not a packet count", cell.as_text())),
    }
}

/// Reads one data row. `Err` means the row is rejected; warnings describe
/// values that were dropped but did not stop the row.
pub fn seed_fields_from_row(row: &[Cell], mapping: &ColumnMapping) -> Result<(SeedFields, Vec<String>), String> {
    let text = |field: SeedField| field_cell(row, mapping, field).as_text();

    let seed_type = text(SeedField::Type);
    let name = text(SeedField::Name);
    let missing: Vec<&str> = [(SeedField::Type, &seed_type), (SeedField::Name, &name)]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field.label())
        .collect();
    if !missing.is_empty() {
        return Err(format!("missing required field(s): {}", missing.join(", ")));
    }

    let mut warnings = vec![];

    let packets_made = packets_from_cell(field_cell(row, mapping, SeedField::PacketsMade)).unwrap_or_else(|e| {
        warnings.push(format!("packets_made: {}, using 0", e));
        0
    });

    let mut date = |field: SeedField| match date_from_cell(field_cell(row, mapping, field)) {
        Ok(date) => date,
        Err(e) => {
            warnings.push(format!("{}: {}, left empty", field.label(), e));
            None
        }
    };
    let date_ordered = date(SeedField::DateOrdered);
    let date_finished = date(SeedField::DateFinished);
    let date_cataloged = date(SeedField::DateCataloged);
    let date_ran_out = date(SeedField::DateRanOut);

    let fields = SeedFields {
        seed_type,
        name,
        packets_made,
        seed_source: text(SeedField::SeedSource),
        date_ordered,
        date_finished,
        date_cataloged,
        date_ran_out,
        amount_text: text(SeedField::AmountText),
    };

    Ok((fields, warnings))
}

/// Upserts every acceptable row and generates its tasks, all in one transaction.
/// Row problems land in the report; only storage failures abort the import.
pub fn import_sheet(
    file_name: &str,
    sheet: &Sheet,
    mapping: &ColumnMapping,
    today: NaiveDate,
    db_connection: &Connection,
) -> InternalResult<ImportReport> {
    let mut report = ImportReport {
        file_name: file_name.to_string(),
        mapping: mapping.describe(&sheet.headers),
        ..ImportReport::default()
    };

    let transaction = db_connection.unchecked_transaction()?;

    for (index, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(Cell::is_blank) {
            continue;
        }
        report.total_rows += 1;
        let row = row_number(index);

        let (fields, warnings) = match seed_fields_from_row(&sheet.rows[index], mapping) {
            Ok(parsed) => parsed,
            Err(message) => {
                tracing::warn!(file_name, row, %message, "skipped import row");
                report.errors.push(RowIssue { row, message });
                continue;
            }
        };
        for message in warnings {
            tracing::warn!(file_name, row, %message, "import row warning");
            report.warnings.push(RowIssue { row, message });
        }

        let (seed, outcome) = upsert_seed(&fields, &transaction)?;
        match outcome {
            UpsertOutcome::Created => report.created += 1,
            UpsertOutcome::Updated => report.updated += 1,
        }
        ensure_inventory(seed.id, &transaction)?;

        let generation = generate_tasks_for_seed(&seed, today, &transaction)?;
        report.tasks_created += generation.created.len();
        report.tasks_cancelled += generation.cancelled.len();
    }

    transaction.commit()?;
    tracing::info!(
        file_name,
        total_rows = report.total_rows,
        imported = report.imported(),
        created = report.created,
        updated = report.updated,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "import finished"
    );

    Ok(report)
}

pub fn import_with_overrides(
    file_name: &str,
    sheet: &Sheet,
    overrides: &ColumnOverrides,
    today: NaiveDate,
    db_connection: &Connection,
) -> InternalResult<ImportReport> {
    let mapping = build_mapping(&sheet.headers, overrides).map_err(InternalError::Mapping)?;
    import_sheet(file_name, sheet, &mapping, today, db_connection)
}

pub fn preview_sheet(file_name: &str, sheet: &Sheet, overrides: &ColumnOverrides) -> ImportPreview {
    let (mapping, mapping_errors) = match build_mapping(&sheet.headers, overrides) {
        Ok(mapping) => (mapping.describe(&sheet.headers), vec![]),
        Err(errors) => (Default::default(), errors),
    };

    ImportPreview {
        file_name: file_name.to_string(),
        headers: sheet.headers.clone(),
        mapping,
        mapping_errors,
        data_rows: sheet.data_rows(),
    }
}
