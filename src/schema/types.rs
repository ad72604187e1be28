// src/schema/types.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One normalized ledger row, shaped like a row of the `orders` table.
///
/// Field order is the column order written to the JSON exports.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderRecord {
    pub date: NaiveDate,
    pub client: Option<String>,
    pub branch: Option<String>,
    pub item: Option<String>,
    pub recipient: Option<String>,
    pub provider: Option<String>,
    pub partner: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub profit: Option<f64>,
    pub notes: Option<String>,
    pub quantity: i64,
}
