//! Domain model for a pregnancy record.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One pregnancy of one cat. The expected delivery date and the three
/// countdown markers are derived once, when the record is created, from the
/// mating date and the configured gestation length. The reminder engine only
/// compares today against the stored markers afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PregnancyRecord {
    pub id: String,
    pub cat_id: String,
    pub male_cat_id: Option<String>,
    pub mating_date: NaiveDate,
    pub expected_delivery_date: NaiveDate,
    /// Date from which the "due in 7 days" reminder fires.
    pub reminder_7_days: NaiveDate,
    /// Date from which the "due in 3 days" reminder fires.
    pub reminder_3_days: NaiveDate,
    /// Date from which the "due in 1 day" reminder fires.
    pub reminder_1_day: NaiveDate,
    pub is_delivered: bool,
    pub delivery_count: Option<u32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Expected delivery date plus the three reminder markers, all derived from
/// one mating date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverySchedule {
    pub expected_delivery_date: NaiveDate,
    pub reminder_7_days: NaiveDate,
    pub reminder_3_days: NaiveDate,
    pub reminder_1_day: NaiveDate,
}

impl PregnancyRecord {
    /// Generate a unique ID for a pregnancy record
    pub fn generate_id(timestamp_millis: u64) -> String {
        format!("pregnancy::{}", timestamp_millis)
    }

    /// Derive the delivery schedule from a mating date and a gestation
    /// length in days.
    pub fn schedule_from_mating(mating_date: NaiveDate, gestation_days: i64) -> DeliverySchedule {
        let expected = mating_date + Duration::days(gestation_days);
        DeliverySchedule {
            expected_delivery_date: expected,
            reminder_7_days: expected - Duration::days(7),
            reminder_3_days: expected - Duration::days(3),
            reminder_1_day: expected - Duration::days(1),
        }
    }
}
