use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::str::FromStr;

use crate::data::{impl_text_column, UnknownVariant};
use crate::seeds::data::SeedID;

pub type AdjustmentID = i64;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Inventory {
    pub id: i64,
    pub seed_id: SeedID,
    pub current_amount: f64,
    pub buy_more: bool,
    pub extra: bool,
    pub notes: String,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum AdjustmentType {
    Restock,
    Usage,
    Correction,
    Manual,
}

impl AdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentType::Restock => "Restock",
            AdjustmentType::Usage => "Usage",
            AdjustmentType::Correction => "Correction",
            AdjustmentType::Manual => "Manual",
        }
    }
}

impl FromStr for AdjustmentType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<AdjustmentType, UnknownVariant> {
        match s.trim().to_lowercase().as_str() {
            "restock" => Ok(AdjustmentType::Restock),
            "usage" | "use" => Ok(AdjustmentType::Usage),
            "correction" => Ok(AdjustmentType::Correction),
            "manual" | "manual update" => Ok(AdjustmentType::Manual),
            _ => Err(UnknownVariant {
                kind: "adjustment type",
                value: s.to_string(),
            }),
        }
    }
}

impl_text_column!(AdjustmentType);

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InventoryAdjustment {
    pub id: AdjustmentID,
    pub seed_id: SeedID,
    pub adjustment_type: AdjustmentType,
    pub amount_change: f64,
    pub reason: String,
    pub adjusted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AdjustRequest {
    pub adjustment_type: AdjustmentType,
    pub amount_change: f64,
    #[serde(default)]
    pub reason: String,
}

/// Every field is optional; absent fields keep their stored value.
#[derive(Deserialize, Debug, Default)]
pub struct InventoryUpdateRequest {
    #[serde(default)]
    pub current_amount: Option<f64>,
    #[serde(default)]
    pub buy_more: Option<bool>,
    #[serde(default)]
    pub extra: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct AdjustmentResult {
    pub inventory: Inventory,
    pub adjustment: InventoryAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryFilter {
    BuyMore,
    Extra,
}

impl FromStr for InventoryFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<InventoryFilter, UnknownVariant> {
        match s.trim().to_lowercase().as_str() {
            "buy_more" => Ok(InventoryFilter::BuyMore),
            "extra" => Ok(InventoryFilter::Extra),
            _ => Err(UnknownVariant {
                kind: "inventory filter",
                value: s.to_string(),
            }),
        }
    }
}
