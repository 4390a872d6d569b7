//! Domain model for a to-do item derived by the reminder engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Which pregnancy countdown marker a reminder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PregnancyThreshold {
    SevenDays,
    ThreeDays,
    OneDay,
}

/// The rule that produced a to-do. Duplicate suppression works on
/// `(cat_id, kind)` over pending items, so every independently firing rule
/// needs its own variant; the human-readable `content` is presentation only
/// and is never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderKind {
    Age,
    Weight,
    WeightStagnation,
    Vaccine,
    ExternalDeworm,
    InternalDeworm,
    Pregnancy(PregnancyThreshold),
}

impl ReminderKind {
    /// Convert to string for CSV storage
    pub fn to_string(&self) -> String {
        match self {
            ReminderKind::Age => "age".to_string(),
            ReminderKind::Weight => "weight".to_string(),
            ReminderKind::WeightStagnation => "weight_stagnation".to_string(),
            ReminderKind::Vaccine => "vaccine".to_string(),
            ReminderKind::ExternalDeworm => "external_deworm".to_string(),
            ReminderKind::InternalDeworm => "internal_deworm".to_string(),
            ReminderKind::Pregnancy(PregnancyThreshold::SevenDays) => "pregnancy_7d".to_string(),
            ReminderKind::Pregnancy(PregnancyThreshold::ThreeDays) => "pregnancy_3d".to_string(),
            ReminderKind::Pregnancy(PregnancyThreshold::OneDay) => "pregnancy_1d".to_string(),
        }
    }

    /// Parse from string for CSV loading
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "age" => Ok(ReminderKind::Age),
            "weight" => Ok(ReminderKind::Weight),
            "weight_stagnation" => Ok(ReminderKind::WeightStagnation),
            "vaccine" => Ok(ReminderKind::Vaccine),
            "external_deworm" => Ok(ReminderKind::ExternalDeworm),
            "internal_deworm" => Ok(ReminderKind::InternalDeworm),
            "pregnancy_7d" => Ok(ReminderKind::Pregnancy(PregnancyThreshold::SevenDays)),
            "pregnancy_3d" => Ok(ReminderKind::Pregnancy(PregnancyThreshold::ThreeDays)),
            "pregnancy_1d" => Ok(ReminderKind::Pregnancy(PregnancyThreshold::OneDay)),
            _ => Err(format!("Invalid reminder kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoStatus {
    Pending,
    Completed,
}

impl TodoStatus {
    /// Convert to string for CSV storage
    pub fn to_string(&self) -> String {
        match self {
            TodoStatus::Pending => "pending".to_string(),
            TodoStatus::Completed => "completed".to_string(),
        }
    }

    /// Parse from string for CSV loading
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TodoStatus::Pending),
            "completed" => Ok(TodoStatus::Completed),
            _ => Err(format!("Invalid todo status: {}", s)),
        }
    }
}

/// A single to-do item. Created only by the reminder engine; completed only
/// by explicit user action; removed only when its cat is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub cat_id: String,
    pub kind: ReminderKind,
    pub content: String,
    pub status: TodoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Generate a unique to-do ID. One reminder pass can create several
    /// items within the same millisecond, so a random suffix is appended.
    /// Format: todo-<timestamp_ms>-<random_suffix>
    pub fn generate_id(timestamp_ms: u64) -> String {
        format!("todo-{}-{}", timestamp_ms, Self::generate_random_suffix(4))
    }

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
}
