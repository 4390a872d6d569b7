use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::health::IllnessRecord;
use crate::storage::traits::IllnessStorage;

const ILLNESSES_FILE: &str = "illnesses.csv";

/// Intermediate row struct for CSV serialization with string date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvIllnessRecord {
    id: String,
    cat_id: String,
    illness_name: String,
    illness_date: String,
    is_cured: bool,
    created_at: String,
}

impl CsvIllnessRecord {
    fn from_domain(record: &IllnessRecord) -> Self {
        Self {
            id: record.id.clone(),
            cat_id: record.cat_id.clone(),
            illness_name: record.illness_name.clone(),
            illness_date: record.illness_date.format("%Y-%m-%d").to_string(),
            is_cured: record.is_cured,
            created_at: record.created_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<IllnessRecord> {
        let illness_date = NaiveDate::parse_from_str(&self.illness_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid illness_date in illness {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in illness {}", self.id))?
            .with_timezone(&Utc);

        Ok(IllnessRecord {
            id: self.id,
            cat_id: self.cat_id,
            illness_name: self.illness_name,
            illness_date,
            is_cured: self.is_cured,
            created_at,
        })
    }
}

/// CSV-based illness repository backed by a single `illnesses.csv` file
#[derive(Clone)]
pub struct IllnessRepository {
    connection: Arc<CsvConnection>,
}

impl IllnessRepository {
    /// Create a new CSV illness repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn file_path(&self) -> PathBuf {
        self.connection.collection_path(ILLNESSES_FILE)
    }

    fn read_records(&self) -> Result<Vec<IllnessRecord>> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvIllnessRecord = row.context("Malformed row in illnesses.csv")?;
            records.push(row.into_domain()?);
        }
        Ok(records)
    }

    fn write_records(&self, records: &[IllnessRecord]) -> Result<()> {
        let file_path = self.file_path();
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for record in records {
                wtr.serialize(CsvIllnessRecord::from_domain(record))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} illnesses to {:?}", records.len(), file_path);
        Ok(())
    }
}

impl IllnessStorage for IllnessRepository {
    fn store_illness(&self, record: &IllnessRecord) -> Result<()> {
        let mut records = self.read_records()?;
        records.push(record.clone());
        self.write_records(&records)
    }

    fn get_illness(&self, record_id: &str) -> Result<Option<IllnessRecord>> {
        let records = self.read_records()?;
        Ok(records.into_iter().find(|r| r.id == record_id))
    }

    fn list_illnesses(&self, cat_id: &str) -> Result<Vec<IllnessRecord>> {
        let mut records: Vec<IllnessRecord> = self
            .read_records()?
            .into_iter()
            .filter(|r| r.cat_id == cat_id)
            .collect();
        records.sort_by(|a, b| a.illness_date.cmp(&b.illness_date));
        Ok(records)
    }

    fn update_illness(&self, record: &IllnessRecord) -> Result<()> {
        let mut records = self.read_records()?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| anyhow::anyhow!("Illness record not found: {}", record.id))?;
        *slot = record.clone();
        self.write_records(&records)
    }

    fn delete_illness(&self, record_id: &str) -> Result<bool> {
        let mut records = self.read_records()?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_records(&records)?;
        Ok(true)
    }

    fn delete_illnesses_for_cat(&self, cat_id: &str) -> Result<u32> {
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

    fn setup() -> (IllnessRepository, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let repo = IllnessRepository::new(Arc::new(env.connection.clone()));
        (repo, env)
    }

    fn record(id: &str, cat_id: &str, name: &str, date: &str) -> IllnessRecord {
        IllnessRecord {
            id: id.to_string(),
            cat_id: cat_id.to_string(),
            illness_name: name.to_string(),
            illness_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            is_cured: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_get_and_list() {
        let (repo, _env) = setup();
        repo.store_illness(&record("i2", "cat::1", "猫藓", "2025-06-01"))
            .unwrap();
        repo.store_illness(&record("i1", "cat::1", "感冒", "2025-05-01"))
            .unwrap();

        let loaded = repo.get_illness("i1").unwrap().unwrap();
        assert_eq!(loaded.illness_name, "感冒");
        assert!(repo.get_illness("missing").unwrap().is_none());

        let records = repo.list_illnesses("cat::1").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "i1");
        assert_eq!(records[1].id, "i2");
    }

    #[test]
    fn test_update_marks_cured() {
        let (repo, _env) = setup();
        let mut illness = record("i1", "cat::1", "感冒", "2025-05-01");
        repo.store_illness(&illness).unwrap();

        illness.is_cured = true;
        repo.update_illness(&illness).unwrap();

        let loaded = repo.get_illness("i1").unwrap().unwrap();
        assert!(loaded.is_cured);
    }

    #[test]
    fn test_update_missing_record_fails() {
        let (repo, _env) = setup();
        let illness = record("i1", "cat::1", "感冒", "2025-05-01");
        assert!(repo.update_illness(&illness).is_err());
    }

    #[test]
    fn test_delete_illnesses() {
        let (repo, _env) = setup();
        repo.store_illness(&record("i1", "cat::1", "感冒", "2025-05-01"))
            .unwrap();
        repo.store_illness(&record("i2", "cat::1", "猫藓", "2025-06-01"))
            .unwrap();

        assert!(repo.delete_illness("i1").unwrap());
        assert_eq!(repo.delete_illnesses_for_cat("cat::1").unwrap(), 1);
        assert!(repo.list_illnesses("cat::1").unwrap().is_empty());
    }
}
