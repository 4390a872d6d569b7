//! Test utilities for the CSV storage layer.
//!
//! Provides an RAII test environment whose temporary data directory is
//! removed when the environment is dropped, even if the test panics.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tempfile::TempDir;

use super::connection::CsvConnection;
use crate::domain::models::cat::Cat;

/// Test environment that provides a temporary data directory and connection.
pub struct TestEnvironment {
    pub connection: CsvConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    /// Create a new test environment with a temporary data directory
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

/// Build a cat with the given ID and name and neutral defaults: no parents,
/// all status flags false, zero weight and money totals.
pub fn test_cat(id: &str, name: &str) -> Cat {
    let now = Utc::now();
    Cat {
        id: id.to_string(),
        name: name.to_string(),
        breed: "Ragdoll".to_string(),
        color: "Seal point".to_string(),
        birth_date: NaiveDate::from_ymd_opt(2023, 4, 1),
        arrival_date: NaiveDate::from_ymd_opt(2023, 6, 1),
        age: 1,
        father_id: None,
        mother_id: None,
        weight: 0.0,
        total_income: 0.0,
        total_expense: 0.0,
        is_pregnant: false,
        is_sick: false,
        is_vaccinated: false,
        is_dewormed: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_cleanup() -> Result<()> {
        let base_path;
        {
            let env = TestEnvironment::new()?;
            base_path = env.base_path.clone();
            assert!(base_path.exists());
            // Environment dropped here
        }
        assert!(!base_path.exists());
        Ok(())
    }
}
