use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::health::{DewormingKind, DewormingRecord};
use crate::storage::traits::DewormingStorage;

const EXTERNAL_DEWORMINGS_FILE: &str = "external_dewormings.csv";
const INTERNAL_DEWORMINGS_FILE: &str = "internal_dewormings.csv";

/// Intermediate row struct for CSV serialization with string date fields.
/// The kind is not a column; it is implied by which collection file a row
/// lives in, mirroring the two separate treatment histories.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvDewormingRecord {
    id: String,
    cat_id: String,
    brand: String,
    deworm_date: String,
    created_at: String,
}

impl CsvDewormingRecord {
    fn from_domain(record: &DewormingRecord) -> Self {
        Self {
            id: record.id.clone(),
            cat_id: record.cat_id.clone(),
            brand: record.brand.clone(),
            deworm_date: record.deworm_date.format("%Y-%m-%d").to_string(),
            created_at: record.created_at.to_rfc3339(),
        }
    }

    fn into_domain(self, kind: DewormingKind) -> Result<DewormingRecord> {
        let deworm_date = NaiveDate::parse_from_str(&self.deworm_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid deworm_date in deworming {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in deworming {}", self.id))?
            .with_timezone(&Utc);

        Ok(DewormingRecord {
            id: self.id,
            cat_id: self.cat_id,
            kind,
            brand: self.brand,
            deworm_date,
            created_at,
        })
    }
}

/// CSV-based deworming repository. External and internal treatments live in
/// two separate collection files so the two histories never mix.
#[derive(Clone)]
pub struct DewormingRepository {
    connection: Arc<CsvConnection>,
}

impl DewormingRepository {
    /// Create a new CSV deworming repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn file_path(&self, kind: DewormingKind) -> PathBuf {
        let file_name = match kind {
            DewormingKind::External => EXTERNAL_DEWORMINGS_FILE,
            DewormingKind::Internal => INTERNAL_DEWORMINGS_FILE,
        };
        self.connection.collection_path(file_name)
    }

    fn read_records(&self, kind: DewormingKind) -> Result<Vec<DewormingRecord>> {
        let file_path = self.file_path(kind);
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvDewormingRecord = row
                .with_context(|| format!("Malformed row in {:?}", file_path))?;
            records.push(row.into_domain(kind)?);
        }
        Ok(records)
    }

    fn write_records(&self, kind: DewormingKind, records: &[DewormingRecord]) -> Result<()> {
        let file_path = self.file_path(kind);
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for record in records {
                wtr.serialize(CsvDewormingRecord::from_domain(record))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!(
            "Wrote {} {} deworming records to {:?}",
            records.len(),
            kind.to_string(),
            file_path
        );
        Ok(())
    }
}

impl DewormingStorage for DewormingRepository {
    fn store_deworming(&self, record: &DewormingRecord) -> Result<()> {
        let mut records = self.read_records(record.kind)?;
        records.push(record.clone());
        self.write_records(record.kind, &records)
    }

    fn list_dewormings(&self, cat_id: &str, kind: DewormingKind) -> Result<Vec<DewormingRecord>> {
        let mut records: Vec<DewormingRecord> = self
            .read_records(kind)?
            .into_iter()
            .filter(|r| r.cat_id == cat_id)
            .collect();
        records.sort_by(|a, b| a.deworm_date.cmp(&b.deworm_date));
        Ok(records)
    }

    fn update_deworming(&self, record: &DewormingRecord) -> Result<()> {
        let mut records = self.read_records(record.kind)?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} deworming record not found: {}",
                    record.kind.to_string(),
                    record.id
                )
            })?;
        *slot = record.clone();
        self.write_records(record.kind, &records)
    }

    fn delete_deworming(&self, kind: DewormingKind, record_id: &str) -> Result<bool> {
        let mut records = self.read_records(kind)?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_records(kind, &records)?;
        Ok(true)
    }

    fn delete_dewormings_for_cat(&self, cat_id: &str) -> Result<u32> {
        let mut deleted = 0;
        for kind in [DewormingKind::External, DewormingKind::Internal] {
            let mut records = self.read_records(kind)?;
            let before = records.len();
            records.retain(|r| r.cat_id != cat_id);
            let removed = (before - records.len()) as u32;
            if removed > 0 {
                self.write_records(kind, &records)?;
            }
            deleted += removed;
        }
        Ok(deleted)
    }
}
