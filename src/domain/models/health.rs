//! Domain models for per-cat health records: weighings, vaccinations,
//! dewormings and illnesses. Each record ties back to one cat by `cat_id`
//! and carries its event date at day granularity; reminder rules never look
//! at times of day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single weighing of one cat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub id: String,
    pub cat_id: String,
    /// Weight in kilograms.
    pub weight: f64,
    pub weigh_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl WeightRecord {
    /// Generate a unique weight record ID.
    /// Format: weight-<timestamp_ms>-<random_suffix>
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("weight-{}-{}", timestamp_ms, generate_random_suffix(4))
    }
}

/// A single vaccine injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    pub id: String,
    pub cat_id: String,
    pub brand: String,
    pub injection_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl VaccinationRecord {
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("vaccine-{}-{}", timestamp_ms, generate_random_suffix(4))
    }
}

/// The two deworming treatments tracked independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DewormingKind {
    External,
    Internal,
}

impl DewormingKind {
    /// Convert to string for CSV storage
    pub fn to_string(&self) -> String {
        match self {
            DewormingKind::External => "external".to_string(),
            DewormingKind::Internal => "internal".to_string(),
        }
    }

    /// Parse from string for CSV loading
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "external" => Ok(DewormingKind::External),
            "internal" => Ok(DewormingKind::Internal),
            _ => Err(format!("Invalid deworming kind: {}", s)),
        }
    }
}

/// A single deworming treatment of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DewormingRecord {
    pub id: String,
    pub cat_id: String,
    pub kind: DewormingKind,
    pub brand: String,
    pub deworm_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl DewormingRecord {
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("deworm-{}-{}", timestamp_ms, generate_random_suffix(4))
    }
}

/// An illness episode; `is_cured` is flipped once the cat recovers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllnessRecord {
    pub id: String,
    pub cat_id: String,
    pub illness_name: String,
    pub illness_date: NaiveDate,
    pub is_cured: bool,
    pub created_at: DateTime<Utc>,
}

impl IllnessRecord {
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("illness::{}", timestamp_ms)
    }
}

/// Generate a random hex suffix for record IDs. Records can be created in
/// bursts within one millisecond (the reminder pass seeds several at once),
/// so the timestamp alone is not unique enough.
fn generate_random_suffix(len: usize) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_nanos();
    format!("{:x}", now % (16_u128.pow(len as u32)))
        .chars()
        .take(len)
        .collect()
}
