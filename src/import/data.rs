use rocket::FromForm;
use serde::Serialize;

use std::collections::BTreeMap;

/// Explicit header names per field, taking precedence over synonym matching.
#[derive(FromForm, Debug, Default, Clone)]
pub struct ColumnOverrides {
    pub type_column: Option<String>,
    pub name_column: Option<String>,
    pub packets_made_column: Option<String>,
    pub seed_source_column: Option<String>,
    pub date_ordered_column: Option<String>,
    pub date_finished_column: Option<String>,
    pub date_cataloged_column: Option<String>,
    pub date_ran_out_column: Option<String>,
    pub amount_text_column: Option<String>,
}

/// A problem tied to a spreadsheet row; rows are numbered as the spreadsheet
/// shows them, so the first data row is row 2.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub row: usize,
    pub message: String,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct ImportReport {
    pub file_name: String,
    pub total_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
    pub tasks_created: usize,
    pub tasks_cancelled: usize,
    pub mapping: BTreeMap<String, String>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.created + self.updated
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ImportPreview {
    pub file_name: String,
    pub headers: Vec<String>,
    pub mapping: BTreeMap<String, String>,
    pub mapping_errors: Vec<String>,
    pub data_rows: usize,
}
