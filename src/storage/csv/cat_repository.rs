use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::cat::{Cat, CatPage, CatQueryFilters};
use crate::storage::traits::CatStorage;

const CATS_FILE: &str = "cats.csv";

/// Intermediate row struct for CSV serialization with string date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CsvCat {
    id: String,
    name: String,
    breed: String,
    color: String,
    birth_date: Option<String>,
    arrival_date: Option<String>,
    age: i32,
    father_id: Option<String>,
    mother_id: Option<String>,
    weight: f64,
    total_income: f64,
    total_expense: f64,
    is_pregnant: bool,
    is_sick: bool,
    is_vaccinated: bool,
    is_dewormed: bool,
    created_at: String,
    updated_at: String,
}

impl CsvCat {
    fn from_domain(cat: &Cat) -> Self {
        Self {
            id: cat.id.clone(),
            name: cat.name.clone(),
            breed: cat.breed.clone(),
            color: cat.color.clone(),
            birth_date: cat.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
            arrival_date: cat.arrival_date.map(|d| d.format("%Y-%m-%d").to_string()),
            age: cat.age,
            father_id: cat.father_id.clone(),
            mother_id: cat.mother_id.clone(),
            weight: cat.weight,
            total_income: cat.total_income,
            total_expense: cat.total_expense,
            is_pregnant: cat.is_pregnant,
            is_sick: cat.is_sick,
            is_vaccinated: cat.is_vaccinated,
            is_dewormed: cat.is_dewormed,
            created_at: cat.created_at.to_rfc3339(),
            updated_at: cat.updated_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<Cat> {
        let birth_date = self
            .birth_date
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .with_context(|| format!("Invalid birth_date in cat {}", self.id))?;
        let arrival_date = self
            .arrival_date
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .with_context(|| format!("Invalid arrival_date in cat {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid created_at in cat {}", self.id))?
            .with_timezone(&Utc);
        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .with_context(|| format!("Invalid updated_at in cat {}", self.id))?
            .with_timezone(&Utc);

        Ok(Cat {
            id: self.id,
            name: self.name,
            breed: self.breed,
            color: self.color,
            birth_date,
            arrival_date,
            age: self.age,
            father_id: self.father_id,
            mother_id: self.mother_id,
            weight: self.weight,
            total_income: self.total_income,
            total_expense: self.total_expense,
            is_pregnant: self.is_pregnant,
            is_sick: self.is_sick,
            is_vaccinated: self.is_vaccinated,
            is_dewormed: self.is_dewormed,
            created_at,
            updated_at,
        })
    }
}

/// CSV-based cat repository backed by a single `cats.csv` file
#[derive(Clone)]
pub struct CatRepository {
    connection: Arc<CsvConnection>,
}

impl CatRepository {
    /// Create a new CSV cat repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn file_path(&self) -> PathBuf {
        self.connection.collection_path(CATS_FILE)
    }

    /// Read all cats from the collection file
    fn read_cats(&self) -> Result<Vec<Cat>> {
        let file_path = self.file_path();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Failed to open {:?}", file_path))?;
        let mut rdr = csv::Reader::from_reader(file);
        let mut cats = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvCat = row.context("Malformed row in cats.csv")?;
            cats.push(row.into_domain()?);
        }
        Ok(cats)
    }

    /// Rewrite the collection file atomically (temp file, then rename)
    fn write_cats(&self, cats: &[Cat]) -> Result<()> {
        let file_path = self.file_path();
        let temp_path = file_path.with_extension("tmp");
        {
            let mut wtr = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for cat in cats {
                wtr.serialize(CsvCat::from_domain(cat))?;
            }
            wtr.flush()?;
        }
        fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} cats to {:?}", cats.len(), file_path);
        Ok(())
    }

    fn matches_filters(cat: &Cat, filters: &CatQueryFilters) -> bool {
        if let Some(ref name) = filters.name {
            if !cat.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(ref breed) = filters.breed {
            if &cat.breed != breed {
                return false;
            }
        }
        true
    }
}

impl CatStorage for CatRepository {
    fn store_cat(&self, cat: &Cat) -> Result<()> {
        let mut cats = self.read_cats()?;
        if cats.iter().any(|c| c.id == cat.id) {
            return Err(anyhow::anyhow!("Cat already exists: {}", cat.id));
        }
        cats.push(cat.clone());
        self.write_cats(&cats)
    }

    fn get_cat(&self, cat_id: &str) -> Result<Option<Cat>> {
        let cats = self.read_cats()?;
        Ok(cats.into_iter().find(|c| c.id == cat_id))
    }

    fn list_cats(&self) -> Result<Vec<Cat>> {
        let mut cats = self.read_cats()?;
        cats.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cats)
    }

    fn get_cat_page(&self, page: u32, page_size: u32, filters: &CatQueryFilters) -> Result<CatPage> {
        let mut cats: Vec<Cat> = self
            .read_cats()?
            .into_iter()
            .filter(|c| Self::matches_filters(c, filters))
            .collect();

        // Stable order across pages: creation time, then ID
        cats.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let total_count = cats.len() as u32;
        let start = page.saturating_sub(1) as usize * page_size as usize;
        let cats = cats
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Ok(CatPage { cats, total_count })
    }

    fn update_cat(&self, cat: &Cat) -> Result<()> {
        let mut cats = self.read_cats()?;
        let slot = cats
            .iter_mut()
            .find(|c| c.id == cat.id)
            .ok_or_else(|| anyhow::anyhow!("Cat not found: {}", cat.id))?;
        *slot = cat.clone();
        self.write_cats(&cats)
    }

    fn delete_cat(&self, cat_id: &str) -> Result<()> {
        let mut cats = self.read_cats()?;
        cats.retain(|c| c.id != cat_id);
        self.write_cats(&cats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{test_cat, TestEnvironment};

    fn setup() -> (CatRepository, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let repo = CatRepository::new(Arc::new(env.connection.clone()));
        (repo, env)
    }

    #[test]
    fn test_store_and_get_cat() {
        let (repo, _env) = setup();
        let cat = test_cat("cat::1", "Momo");

        repo.store_cat(&cat).unwrap();

        let loaded = repo.get_cat("cat::1").unwrap().unwrap();
        assert_eq!(loaded, cat);
        assert!(repo.get_cat("cat::2").unwrap().is_none());
    }

    #[test]
    fn test_store_rejects_duplicate_id() {
        let (repo, _env) = setup();
        let cat = test_cat("cat::1", "Momo");

        repo.store_cat(&cat).unwrap();
        assert!(repo.store_cat(&cat).is_err());
    }

    #[test]
    fn test_optional_fields_round_trip() {
        let (repo, _env) = setup();
        let mut cat = test_cat("cat::1", "Momo");
        cat.birth_date = None;
        cat.father_id = None;
        cat.mother_id = Some("cat::9".to_string());

        repo.store_cat(&cat).unwrap();

        let loaded = repo.get_cat("cat::1").unwrap().unwrap();
        assert_eq!(loaded.birth_date, None);
        assert_eq!(loaded.father_id, None);
        assert_eq!(loaded.mother_id, Some("cat::9".to_string()));
    }

    #[test]
    fn test_list_cats_sorted_by_name() {
        let (repo, _env) = setup();
        repo.store_cat(&test_cat("cat::1", "Wasabi")).unwrap();
        repo.store_cat(&test_cat("cat::2", "Momo")).unwrap();

        let cats = repo.list_cats().unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].name, "Momo");
        assert_eq!(cats[1].name, "Wasabi");
    }

    #[test]
    fn test_update_cat() {
        let (repo, _env) = setup();
        let mut cat = test_cat("cat::1", "Momo");
        repo.store_cat(&cat).unwrap();

        cat.weight = 4.2;
        cat.is_sick = true;
        repo.update_cat(&cat).unwrap();

        let loaded = repo.get_cat("cat::1").unwrap().unwrap();
        assert_eq!(loaded.weight, 4.2);
        assert!(loaded.is_sick);
    }

    #[test]
    fn test_update_missing_cat_fails() {
        let (repo, _env) = setup();
        let cat = test_cat("cat::1", "Momo");
        assert!(repo.update_cat(&cat).is_err());
    }

    #[test]
    fn test_delete_cat() {
        let (repo, _env) = setup();
        repo.store_cat(&test_cat("cat::1", "Momo")).unwrap();

        repo.delete_cat("cat::1").unwrap();
        assert!(repo.get_cat("cat::1").unwrap().is_none());
    }

    #[test]
    fn test_get_cat_page_filters_and_paginates() {
        let (repo, _env) = setup();
        for i in 0..5 {
            let mut cat = test_cat(&format!("cat::{}", i), &format!("Momo {}", i));
            cat.breed = if i % 2 == 0 { "Ragdoll" } else { "Siamese" }.to_string();
            cat.created_at = Utc::now() + chrono::Duration::seconds(i);
            cat.updated_at = cat.created_at;
            repo.store_cat(&cat).unwrap();
        }

        let all = repo
            .get_cat_page(1, 2, &CatQueryFilters::default())
            .unwrap();
        assert_eq!(all.total_count, 5);
        assert_eq!(all.cats.len(), 2);
        assert_eq!(all.cats[0].id, "cat::0");

        let last_page = repo
            .get_cat_page(3, 2, &CatQueryFilters::default())
            .unwrap();
        assert_eq!(last_page.cats.len(), 1);
        assert_eq!(last_page.cats[0].id, "cat::4");

        let ragdolls = repo
            .get_cat_page(
                1,
                10,
                &CatQueryFilters {
                    name: None,
                    breed: Some("Ragdoll".to_string()),
                },
            )
            .unwrap();
        assert_eq!(ragdolls.total_count, 3);

        let by_name = repo
            .get_cat_page(
                1,
                10,
                &CatQueryFilters {
                    name: Some("momo 3".to_string()),
                    breed: None,
                },
            )
            .unwrap();
        assert_eq!(by_name.total_count, 1);
        assert_eq!(by_name.cats[0].name, "Momo 3");
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let (repo, _env) = setup();
        repo.store_cat(&test_cat("cat::1", "Momo")).unwrap();

        let page = repo
            .get_cat_page(4, 10, &CatQueryFilters::default())
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert!(page.cats.is_empty());
    }
}
