use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use crate::internal_error::{InternalError, InternalResult};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%b %d, %Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// Task due dates and overdue checks use the server's local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses the date spellings seen in spreadsheets. Returns `None` for anything else.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Form input: empty means "no date", anything else must be `YYYY-MM-DD`.
pub fn parse_optional_iso_date(field: &str, value: Option<&str>) -> InternalResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| InternalError::Validation(format!("{} must be a YYYY-MM-DD date, got '{}'", field, text))),
    }
}
