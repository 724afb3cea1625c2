use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;

use std::io::Cursor;
use std::path::Path;

use crate::internal_error::{InternalError, InternalResult};

pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Cell contents as trimmed text; whole numbers lose their ".0".
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(text) => text.trim().to_string(),
            Cell::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                format!("{}", *number as i64)
            }
            Cell::Number(number) => number.to_string(),
            Cell::Bool(value) => value.to_string(),
            Cell::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Cell {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::Text(text.clone()),
            Data::Float(number) => Cell::Number(*number),
            Data::Int(number) => Cell::Number(*number as f64),
            Data::Bool(value) => Cell::Bool(*value),
            Data::DateTime(datetime) => match datetime.as_datetime() {
                Some(datetime) => Cell::Date(datetime.date()),
                None => Cell::Number(datetime.as_f64()),
            },
        }
    }
}

/// First worksheet of a workbook: a trimmed header row and the data rows under it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn data_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| !row.iter().all(Cell::is_blank))
            .count()
    }
}

pub fn check_file_name(file_name: &str) -> InternalResult<()> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase);

    match extension {
        Some(extension) if ALLOWED_EXTENSIONS.contains(&extension.as_str()) => Ok(()),
        _ => Err(InternalError::UnsupportedFile(format!(
            "'{}' is not a spreadsheet; upload one of: {}",
            file_name,
            ALLOWED_EXTENSIONS.join(", ")
        ))),
    }
}

pub fn read_workbook(bytes: Vec<u8>) -> InternalResult<Sheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InternalError::Spreadsheet("workbook has no worksheets".to_string()))??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|data| Cell::from(data).as_text())
            .collect(),
        None => return Err(InternalError::Spreadsheet("worksheet is empty".to_string())),
    };

    let rows = rows
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    Ok(Sheet { headers, rows })
}

/// Three seed rows with date-formatted cells and a "Variety Label" name column.
#[cfg(test)]
pub const SAMPLE_WORKBOOK: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/seeds.xlsx"));
