use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::health::VaccinationRecord;
use crate::storage::traits::VaccinationStorage;

const VACCINATIONS_FILE: &str = "vaccinations.csv";

/// Intermediate row struct for CSV serialization with string date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvVaccinationRecord {
    id: String,
    cat_id: String,
    brand: String,
    injection_date: String,
    created_at: String,
}

impl CsvVaccinationRecord {
    fn from_domain(record: &VaccinationRecord) -> Self {
        Self {
            id: record.id.clone(),
            cat_id: record.cat_id.clone(),
            brand: record.brand.clone(),
            injection_date: record.injection_date.format("%Y-%m-%d").to_string(),
            created_at: record.created_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<VaccinationRecord> {
        let injection_date = NaiveDate::parse_from_str(&self.injection_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid injection_date in vaccination {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in vaccination {}", self.id))?
            .with_timezone(&Utc);

        Ok(VaccinationRecord {
            id: self.id,
            cat_id: self.cat_id,
            brand: self.brand,
            injection_date,
            created_at,
        })
    }
}

/// CSV-based vaccination repository backed by a single `vaccinations.csv` file
#[derive(Clone)]
pub struct VaccinationRepository {
    connection: Arc<CsvConnection>,
}

impl VaccinationRepository {
    /// Create a new CSV vaccination repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn file_path(&self) -> PathBuf {
        self.connection.collection_path(VACCINATIONS_FILE)
    }

    fn read_records(&self) -> Result<Vec<VaccinationRecord>> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvVaccinationRecord = row.context("Malformed row in vaccinations.csv")?;
            records.push(row.into_domain()?);
        }
        Ok(records)
    }

    fn write_records(&self, records: &[VaccinationRecord]) -> Result<()> {
        let file_path = self.file_path();
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for record in records {
                wtr.serialize(CsvVaccinationRecord::from_domain(record))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} vaccinations to {:?}", records.len(), file_path);
        Ok(())
    }
}

impl VaccinationStorage for VaccinationRepository {
    fn store_vaccination(&self, record: &VaccinationRecord) -> Result<()> {
        let mut records = self.read_records()?;
        records.push(record.clone());
        self.write_records(&records)
    }

    fn list_vaccinations(&self, cat_id: &str) -> Result<Vec<VaccinationRecord>> {
        let mut records: Vec<VaccinationRecord> = self
            .read_records()?
            .into_iter()
            .filter(|r| r.cat_id == cat_id)
            .collect();
        records.sort_by(|a, b| a.injection_date.cmp(&b.injection_date));
        Ok(records)
    }

    fn update_vaccination(&self, record: &VaccinationRecord) -> Result<()> {
        let mut records = self.read_records()?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| anyhow::anyhow!("Vaccination record not found: {}", record.id))?;
        *slot = record.clone();
        self.write_records(&records)
    }

    fn delete_vaccination(&self, record_id: &str) -> Result<bool> {
        let mut records = self.read_records()?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_records(&records)?;
        Ok(true)
    }

    fn delete_vaccinations_for_cat(&self, cat_id: &str) -> Result<u32> {
        let mut records = self.read_records()?;
        let before = records.len();
        records.retain(|r| r.cat_id != cat_id);
        let deleted = (before - records.len()) as u32;
        if deleted > 0 {
            self.write_records(&records)?;
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    fn setup() -> (VaccinationRepository, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let repo = VaccinationRepository::new(Arc::new(env.connection.clone()));
        (repo, env)
    }

    fn record(id: &str, cat_id: &str, brand: &str, date: &str) -> VaccinationRecord {
        VaccinationRecord {
            id: id.to_string(),
            cat_id: cat_id.to_string(),
            brand: brand.to_string(),
            injection_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_and_list_sorted_by_date() {
        let (repo, _env) = setup();
        repo.store_vaccination(&record("v2", "cat::1", "妙三多", "2025-02-01"))
            .unwrap();
        repo.store_vaccination(&record("v1", "cat::1", "妙三多", "2024-02-01"))
            .unwrap();

        let records = repo.list_vaccinations("cat::1").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "v1");
        assert_eq!(records[1].id, "v2");
    }

    #[test]
    fn test_brand_with_unicode_round_trips() {
        let (repo, _env) = setup();
        repo.store_vaccination(&record("v1", "cat::1", "初始疫苗", "2025-02-01"))
            .unwrap();

        let records = repo.list_vaccinations("cat::1").unwrap();
        assert_eq!(records[0].brand, "初始疫苗");
    }

    #[test]
    fn test_update_vaccination() {
        let (repo, _env) = setup();
        repo.store_vaccination(&record("v1", "cat::1", "妙三多", "2024-02-01"))
            .unwrap();

        repo.update_vaccination(&record("v1", "cat::1", "瑞贝康", "2024-02-02"))
            .unwrap();

        let records = repo.list_vaccinations("cat::1").unwrap();
        assert_eq!(records[0].brand, "瑞贝康");

        let missing = record("v9", "cat::1", "妙三多", "2024-02-01");
        assert!(repo.update_vaccination(&missing).is_err());
    }

    #[test]
    fn test_delete_vaccinations() {
        let (repo, _env) = setup();
        repo.store_vaccination(&record("v1", "cat::1", "妙三多", "2024-02-01"))
            .unwrap();
        repo.store_vaccination(&record("v2", "cat::2", "妙三多", "2024-03-01"))
            .unwrap();

        assert!(repo.delete_vaccination("v1").unwrap());
        assert!(!repo.delete_vaccination("v1").unwrap());
        assert_eq!(repo.delete_vaccinations_for_cat("cat::2").unwrap(), 1);
        assert!(repo.list_vaccinations("cat::2").unwrap().is_empty());
    }
}
