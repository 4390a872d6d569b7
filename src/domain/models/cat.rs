//! Domain model for a cat.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Core profile record for one cat in the cattery.
///
/// The four `is_*` flags are derived caches: they are overwritten from the
/// cat's health records on every status recalculation and must never be
/// treated as user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    pub id: String,
    pub name: String,
    pub breed: String,
    pub color: String,
    pub birth_date: Option<NaiveDate>,
    pub arrival_date: Option<NaiveDate>,
    /// Age in full years. The age reminder treats the next birthday as
    /// `birth_date + (age + 1)` years.
    pub age: i32,
    pub father_id: Option<String>,
    pub mother_id: Option<String>,
    /// Profile weight in kilograms, used to seed the weight history when a
    /// cat has no weight records yet.
    pub weight: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub is_pregnant: bool,
    pub is_sick: bool,
    pub is_vaccinated: bool,
    pub is_dewormed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cat {
    /// Generate a unique ID for a cat
    pub fn generate_id(timestamp_millis: u64) -> String {
        format!("cat::{}", timestamp_millis)
    }
}

/// Filters accepted by paged cat queries.
#[derive(Debug, Clone, Default)]
pub struct CatQueryFilters {
    /// Case-insensitive substring match on the cat name.
    pub name: Option<String>,
    /// Exact match on the breed.
    pub breed: Option<String>,
}

/// One page of cats plus the total count matching the filters.
#[derive(Debug, Clone)]
pub struct CatPage {
    pub cats: Vec<Cat>,
    pub total_count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum CatValidationError {
    #[error("Cat name cannot be empty")]
    EmptyName,
    #[error("Cat name cannot exceed 100 characters")]
    NameTooLong,
    #[error("Weight cannot be negative")]
    NegativeWeight,
    #[error("Age cannot be negative")]
    NegativeAge,
}
