use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

use crate::internal_error::{InternalError, InternalResult};
use crate::inventory::data::{Inventory, InventoryAdjustment};
use crate::tasks::data::Task;
use crate::tasks::generator::GenerationSummary;
use crate::util::parse_optional_iso_date;

pub type SeedID = i64;

/// Case-folded, trimmed form of a name or type; seeds are unique on the pair.
pub fn identity_key(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Seed {
    pub id: SeedID,
    #[serde(rename = "type")]
    pub seed_type: String,
    pub name: String,
    pub packets_made: i64,
    pub seed_source: String,
    pub date_ordered: Option<NaiveDate>,
    pub date_finished: Option<NaiveDate>,
    pub date_cataloged: Option<NaiveDate>,
    pub date_ran_out: Option<NaiveDate>,
    pub amount_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The user-editable part of a seed, as read from an import row or an edit request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedFields {
    pub seed_type: String,
    pub name: String,
    pub packets_made: i64,
    pub seed_source: String,
    pub date_ordered: Option<NaiveDate>,
    pub date_finished: Option<NaiveDate>,
    pub date_cataloged: Option<NaiveDate>,
    pub date_ran_out: Option<NaiveDate>,
    pub amount_text: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Deserialize, Debug)]
pub struct SeedUpdateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub seed_type: String,
    #[serde(default)]
    pub packets_made: i64,
    #[serde(default)]
    pub seed_source: String,
    #[serde(default)]
    pub date_ordered: Option<String>,
    #[serde(default)]
    pub date_finished: Option<String>,
    #[serde(default)]
    pub date_cataloged: Option<String>,
    #[serde(default)]
    pub date_ran_out: Option<String>,
    #[serde(default)]
    pub amount_text: String,
}

impl SeedUpdateRequest {
    pub fn into_fields(self) -> InternalResult<SeedFields> {
        let name = self.name.trim().to_string();
        let seed_type = self.seed_type.trim().to_string();

        if name.is_empty() {
            return Err(InternalError::Validation("name must not be empty".to_string()));
        }
        if seed_type.is_empty() {
            return Err(InternalError::Validation("type must not be empty".to_string()));
        }
        if self.packets_made < 0 {
            return Err(InternalError::Validation(
                "packets_made must not be negative".to_string(),
            ));
        }

        Ok(SeedFields {
            seed_type,
            name,
            packets_made: self.packets_made,
            seed_source: self.seed_source.trim().to_string(),
            date_ordered: parse_optional_iso_date("date_ordered", self.date_ordered.as_deref())?,
            date_finished: parse_optional_iso_date("date_finished", self.date_finished.as_deref())?,
            date_cataloged: parse_optional_iso_date("date_cataloged", self.date_cataloged.as_deref())?,
            date_ran_out: parse_optional_iso_date("date_ran_out", self.date_ran_out.as_deref())?,
            amount_text: self.amount_text.trim().to_string(),
        })
    }
}

/// Seeds picked for label printing; unknown ids are skipped.
#[derive(Deserialize, Debug, Default)]
pub struct LabelRequest {
    #[serde(default)]
    pub seed_ids: Vec<SeedID>,
}

#[derive(Serialize, Debug)]
pub struct SeedDetail {
    pub seed: Seed,
    pub tasks: Vec<Task>,
    pub inventory: Option<Inventory>,
    pub adjustments: Vec<InventoryAdjustment>,
}

#[derive(Serialize, Debug)]
pub struct SeedUpdateResult {
    pub seed: Seed,
    pub generation: GenerationSummary,
}

pub type CategoryCounts = BTreeMap<String, usize>;

pub const UNCATEGORIZED: &str = "Uncategorized";
