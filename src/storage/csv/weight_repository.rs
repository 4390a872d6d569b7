use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::health::WeightRecord;
use crate::storage::traits::WeightStorage;

const WEIGHT_RECORDS_FILE: &str = "weight_records.csv";

/// Intermediate row struct for CSV serialization with string date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvWeightRecord {
    id: String,
    cat_id: String,
    weight: f64,
    weigh_date: String,
    created_at: String,
}

impl CsvWeightRecord {
    fn from_domain(record: &WeightRecord) -> Self {
        Self {
            id: record.id.clone(),
            cat_id: record.cat_id.clone(),
            weight: record.weight,
            weigh_date: record.weigh_date.format("%Y-%m-%d").to_string(),
            created_at: record.created_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<WeightRecord> {
        let weigh_date = NaiveDate::parse_from_str(&self.weigh_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid weigh_date in weight record {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in weight record {}", self.id))?
            .with_timezone(&Utc);

        Ok(WeightRecord {
            id: self.id,
            cat_id: self.cat_id,
            weight: self.weight,
            weigh_date,
            created_at,
        })
    }
}

/// CSV-based weight record repository backed by a single `weight_records.csv` file
#[derive(Clone)]
pub struct WeightRepository {
    connection: Arc<CsvConnection>,
}

impl WeightRepository {
    /// Create a new CSV weight record repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn file_path(&self) -> PathBuf {
        self.connection.collection_path(WEIGHT_RECORDS_FILE)
    }

    fn read_records(&self) -> Result<Vec<WeightRecord>> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvWeightRecord = row.context("Malformed row in weight_records.csv")?;
            records.push(row.into_domain()?);
        }
        Ok(records)
    }

    fn write_records(&self, records: &[WeightRecord]) -> Result<()> {
        let file_path = self.file_path();
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for record in records {
                wtr.serialize(CsvWeightRecord::from_domain(record))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} weight records to {:?}", records.len(), file_path);
        Ok(())
    }
}

impl WeightStorage for WeightRepository {
    fn store_weight_record(&self, record: &WeightRecord) -> Result<()> {
        let mut records = self.read_records()?;
        records.push(record.clone());
        self.write_records(&records)
    }

    fn list_weight_records(&self, cat_id: &str) -> Result<Vec<WeightRecord>> {
        let mut records: Vec<WeightRecord> = self
            .read_records()?
            .into_iter()
            .filter(|r| r.cat_id == cat_id)
            .collect();
        records.sort_by(|a, b| a.weigh_date.cmp(&b.weigh_date));
        Ok(records)
    }

    fn update_weight_record(&self, record: &WeightRecord) -> Result<()> {
        let mut records = self.read_records()?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| anyhow::anyhow!("Weight record not found: {}", record.id))?;
        *slot = record.clone();
        self.write_records(&records)
    }

    fn delete_weight_record(&self, record_id: &str) -> Result<bool> {
        let mut records = self.read_records()?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_records(&records)?;
        Ok(true)
    }

    fn delete_weight_records_for_cat(&self, cat_id: &str) -> Result<u32> {
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
