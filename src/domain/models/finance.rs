//! Domain models for money movements: purchases and sales.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An expense. `cat_id = Some` marks a single-cat expense booked against that
/// cat; `None` marks a shared expense split across the whole cattery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub item: String,
    pub amount: f64,
    pub cat_id: Option<String>,
    pub purchase_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    /// Generate a unique ID for a purchase
    pub fn generate_id(timestamp_millis: u64) -> String {
        format!("purchase::{}", timestamp_millis)
    }
}

/// What was sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleKind {
    Goods,
    Kitten,
}

impl SaleKind {
    /// Convert to string for CSV storage
    pub fn to_string(&self) -> String {
        match self {
            SaleKind::Goods => "goods".to_string(),
            SaleKind::Kitten => "kitten".to_string(),
        }
    }

    /// Parse from string for CSV loading
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "goods" => Ok(SaleKind::Goods),
            "kitten" => Ok(SaleKind::Kitten),
            _ => Err(format!("Invalid sale kind: {}", s)),
        }
    }
}

/// An income record. Kitten sales reference the sold kitten so the proceeds
/// can be credited to its parents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    pub kind: SaleKind,
    pub item: String,
    pub amount: f64,
    pub kitten_id: Option<String>,
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl SaleRecord {
    /// Generate a unique ID for a sale
    pub fn generate_id(timestamp_millis: u64) -> String {
        format!("sale::{}", timestamp_millis)
    }
}
