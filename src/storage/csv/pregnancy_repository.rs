use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::pregnancy::PregnancyRecord;
use crate::storage::traits::PregnancyStorage;

const PREGNANCIES_FILE: &str = "pregnancies.csv";

/// Intermediate row struct for CSV serialization with string date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvPregnancyRecord {
    id: String,
    cat_id: String,
    male_cat_id: Option<String>,
    mating_date: String,
    expected_delivery_date: String,
    reminder_7_days: String,
    reminder_3_days: String,
    reminder_1_day: String,
    is_delivered: bool,
    delivery_count: Option<u32>,
    notes: Option<String>,
    created_at: String,
}

impl CsvPregnancyRecord {
    fn from_domain(record: &PregnancyRecord) -> Self {
        Self {
            id: record.id.clone(),
            cat_id: record.cat_id.clone(),
            male_cat_id: record.male_cat_id.clone(),
            mating_date: record.mating_date.format("%Y-%m-%d").to_string(),
            expected_delivery_date: record
                .expected_delivery_date
                .format("%Y-%m-%d")
                .to_string(),
            reminder_7_days: record.reminder_7_days.format("%Y-%m-%d").to_string(),
            reminder_3_days: record.reminder_3_days.format("%Y-%m-%d").to_string(),
            reminder_1_day: record.reminder_1_day.format("%Y-%m-%d").to_string(),
            is_delivered: record.is_delivered,
            delivery_count: record.delivery_count,
            notes: record.notes.clone(),
            created_at: record.created_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<PregnancyRecord> {
        let parse = |field: &str, value: &str| -> Result<NaiveDate> {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .with_context(|| format!("Invalid {} in pregnancy {}", field, self.id))
        };

        let mating_date = parse("mating_date", &self.mating_date)?;
        let expected_delivery_date =
            parse("expected_delivery_date", &self.expected_delivery_date)?;
        let reminder_7_days = parse("reminder_7_days", &self.reminder_7_days)?;
        let reminder_3_days = parse("reminder_3_days", &self.reminder_3_days)?;
        let reminder_1_day = parse("reminder_1_day", &self.reminder_1_day)?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in pregnancy {}", self.id))?
            .with_timezone(&Utc);

        Ok(PregnancyRecord {
            id: self.id,
            cat_id: self.cat_id,
            male_cat_id: self.male_cat_id,
            mating_date,
            expected_delivery_date,
            reminder_7_days,
            reminder_3_days,
            reminder_1_day,
            is_delivered: self.is_delivered,
            delivery_count: self.delivery_count,
            notes: self.notes,
            created_at,
        })
    }
}

/// CSV-based pregnancy repository backed by a single `pregnancies.csv` file
#[derive(Clone)]
pub struct PregnancyRepository {
    connection: Arc<CsvConnection>,
}

impl PregnancyRepository {
    /// Create a new CSV pregnancy repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn file_path(&self) -> PathBuf {
        self.connection.collection_path(PREGNANCIES_FILE)
    }

    fn read_records(&self) -> Result<Vec<PregnancyRecord>> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvPregnancyRecord = row.context("Malformed row in pregnancies.csv")?;
            records.push(row.into_domain()?);
        }
        Ok(records)
    }

    fn write_records(&self, records: &[PregnancyRecord]) -> Result<()> {
        let file_path = self.file_path();
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for record in records {
                wtr.serialize(CsvPregnancyRecord::from_domain(record))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} pregnancies to {:?}", records.len(), file_path);
        Ok(())
    }
}

impl PregnancyStorage for PregnancyRepository {
    fn store_pregnancy(&self, record: &PregnancyRecord) -> Result<()> {
        let mut records = self.read_records()?;
        records.push(record.clone());
        self.write_records(&records)
    }

    fn get_pregnancy(&self, record_id: &str) -> Result<Option<PregnancyRecord>> {
        let records = self.read_records()?;
        Ok(records.into_iter().find(|r| r.id == record_id))
    }

    fn list_pregnancies(&self, cat_id: &str) -> Result<Vec<PregnancyRecord>> {
        let mut records: Vec<PregnancyRecord> = self
            .read_records()?
            .into_iter()
            .filter(|r| r.cat_id == cat_id)
            .collect();
        records.sort_by(|a, b| a.mating_date.cmp(&b.mating_date));
        Ok(records)
    }

    fn update_pregnancy(&self, record: &PregnancyRecord) -> Result<()> {
        let mut records = self.read_records()?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| anyhow::anyhow!("Pregnancy record not found: {}", record.id))?;
        *slot = record.clone();
        self.write_records(&records)
    }

    fn delete_pregnancy(&self, record_id: &str) -> Result<bool> {
        let mut records = self.read_records()?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_records(&records)?;
        Ok(true)
    }

    fn delete_pregnancies_for_cat(&self, cat_id: &str) -> Result<u32> {
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

    fn setup() -> (PregnancyRepository, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let repo = PregnancyRepository::new(Arc::new(env.connection.clone()));
        (repo, env)
    }

    fn record(id: &str, cat_id: &str, mating: &str) -> PregnancyRecord {
        let mating_date = NaiveDate::parse_from_str(mating, "%Y-%m-%d").unwrap();
        let schedule = PregnancyRecord::schedule_from_mating(mating_date, 63);
        PregnancyRecord {
            id: id.to_string(),
            cat_id: cat_id.to_string(),
            male_cat_id: Some("cat::9".to_string()),
            mating_date,
            expected_delivery_date: schedule.expected_delivery_date,
            reminder_7_days: schedule.reminder_7_days,
            reminder_3_days: schedule.reminder_3_days,
            reminder_1_day: schedule.reminder_1_day,
            is_delivered: false,
            delivery_count: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_store_and_round_trip_all_dates() {
        let (repo, _env) = setup();
        let pregnancy = record("p1", "cat::1", "2025-03-01");
        repo.store_pregnancy(&pregnancy).unwrap();

        let loaded = repo.get_pregnancy("p1").unwrap().unwrap();
        assert_eq!(loaded, pregnancy);
    }

    #[test]
    fn test_notes_with_commas_round_trip() {
        let (repo, _env) = setup();
        let mut pregnancy = record("p1", "cat::1", "2025-03-01");
        pregnancy.notes = Some("第一胎, 注意产房温度".to_string());
        repo.store_pregnancy(&pregnancy).unwrap();

        let loaded = repo.get_pregnancy("p1").unwrap().unwrap();
        assert_eq!(loaded.notes, pregnancy.notes);
    }

    #[test]
    fn test_list_sorted_by_mating_date() {
        let (repo, _env) = setup();
        repo.store_pregnancy(&record("p2", "cat::1", "2025-03-01"))
            .unwrap();
        repo.store_pregnancy(&record("p1", "cat::1", "2024-09-01"))
            .unwrap();

        let records = repo.list_pregnancies("cat::1").unwrap();
        assert_eq!(records[0].id, "p1");
        assert_eq!(records[1].id, "p2");
    }

    #[test]
    fn test_update_records_delivery() {
        let (repo, _env) = setup();
        let mut pregnancy = record("p1", "cat::1", "2025-03-01");
        repo.store_pregnancy(&pregnancy).unwrap();

        pregnancy.is_delivered = true;
        pregnancy.delivery_count = Some(4);
        repo.update_pregnancy(&pregnancy).unwrap();

        let loaded = repo.get_pregnancy("p1").unwrap().unwrap();
        assert!(loaded.is_delivered);
        assert_eq!(loaded.delivery_count, Some(4));
    }

    #[test]
    fn test_delete_pregnancies() {
        let (repo, _env) = setup();
        repo.store_pregnancy(&record("p1", "cat::1", "2025-03-01"))
            .unwrap();
        repo.store_pregnancy(&record("p2", "cat::2", "2025-03-02"))
            .unwrap();

        assert!(repo.delete_pregnancy("p1").unwrap());
        assert!(!repo.delete_pregnancy("p1").unwrap());
        assert_eq!(repo.delete_pregnancies_for_cat("cat::2").unwrap(), 1);
    }
}
