use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::domain::commands::cats::{
    CatPageQuery, CatPageResult, CreateCatCommand, CreateCatResult, DeleteCatCommand,
    DeleteCatResult, GetCatCommand, GetCatResult, ListCatsResult, UpdateCatCommand,
    UpdateCatResult,
};
use crate::domain::models::cat::{Cat, CatQueryFilters, CatValidationError};
use crate::domain::models::settings::ReminderSettings;
use crate::storage::csv::{
    CatRepository, CsvConnection, DewormingRepository, IllnessRepository, PregnancyRepository,
    SettingsRepository, SettingsStorage, TodoRepository, VaccinationRepository, WeightRepository,
};
use crate::storage::traits::{
    CatStorage, DewormingStorage, IllnessStorage, PregnancyStorage, TodoStorage,
    VaccinationStorage, WeightStorage,
};
use crate::domain::models::health::DewormingKind;

/// Page size used when walking the whole cattery.
const STATUS_PAGE_SIZE: u32 = 100;

/// Service for managing cat profiles and their derived status flags.
///
/// Besides CRUD this service owns status recalculation: the four `is_*`
/// flags on a cat are caches over its health records and are recomputed
/// here, never written directly by callers.
#[derive(Clone)]
pub struct CatService {
    cat_repository: CatRepository,
    weight_repository: WeightRepository,
    vaccination_repository: VaccinationRepository,
    deworming_repository: DewormingRepository,
    illness_repository: IllnessRepository,
    pregnancy_repository: PregnancyRepository,
    todo_repository: TodoRepository,
    settings_repository: SettingsRepository,
}

impl CatService {
    /// Create a new CatService
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        Self {
            cat_repository: CatRepository::new(csv_conn.clone()),
            weight_repository: WeightRepository::new(csv_conn.clone()),
            vaccination_repository: VaccinationRepository::new(csv_conn.clone()),
            deworming_repository: DewormingRepository::new(csv_conn.clone()),
            illness_repository: IllnessRepository::new(csv_conn.clone()),
            pregnancy_repository: PregnancyRepository::new(csv_conn.clone()),
            todo_repository: TodoRepository::new(csv_conn.clone()),
            settings_repository: SettingsRepository::new(csv_conn),
        }
    }

    /// Create a new cat
    pub fn create_cat(&self, command: CreateCatCommand) -> Result<CreateCatResult> {
        info!("Creating cat: name={}, breed={}", command.name, command.breed);

        self.validate_create_command(&command)?;

        let now = Utc::now();
        let birth_date = command
            .birth_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .context("Invalid birth_date format in create_cat command")?;
        let arrival_date = command
            .arrival_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .context("Invalid arrival_date format in create_cat command")?;

        // Derive the age from the birth date when the caller didn't state it
        let age = match command.age {
            Some(age) => age,
            None => birth_date
                .and_then(|b| Local::now().date_naive().years_since(b))
                .map(|years| years as i32)
                .unwrap_or(0),
        };

        let cat = Cat {
            id: Cat::generate_id(now.timestamp_millis() as u64),
            name: command.name.trim().to_string(),
            breed: command.breed.trim().to_string(),
            color: command.color.trim().to_string(),
            birth_date,
            arrival_date,
            age,
            father_id: command.father_id,
            mother_id: command.mother_id,
            weight: command.weight,
            total_income: 0.0,
            total_expense: 0.0,
            is_pregnant: false,
            is_sick: false,
            is_vaccinated: false,
            is_dewormed: false,
            created_at: now,
            updated_at: now,
        };

        self.cat_repository.store_cat(&cat)?;

        info!("Created cat: {} with ID: {}", cat.name, cat.id);

        Ok(CreateCatResult { cat })
    }

    /// Get a cat by ID
    pub fn get_cat(&self, command: GetCatCommand) -> Result<GetCatResult> {
        debug!("Getting cat: {}", command.cat_id);

        let cat = self.cat_repository.get_cat(&command.cat_id)?;

        if cat.is_none() {
            warn!("Cat not found: {}", command.cat_id);
        }

        Ok(GetCatResult { cat })
    }

    /// List all cats ordered by name
    pub fn list_cats(&self) -> Result<ListCatsResult> {
        let cats = self.cat_repository.list_cats()?;
        debug!("Found {} cats", cats.len());
        Ok(ListCatsResult { cats })
    }

    /// Fetch one page of cats matching the query
    pub fn get_cat_page(&self, query: CatPageQuery) -> Result<CatPageResult> {
        let filters = CatQueryFilters {
            name: query.name,
            breed: query.breed,
        };
        let page = self
            .cat_repository
            .get_cat_page(query.page, query.page_size, &filters)?;

        Ok(CatPageResult {
            cats: page.cats,
            total_count: page.total_count,
        })
    }

    /// Update an existing cat
    pub fn update_cat(&self, command: UpdateCatCommand) -> Result<UpdateCatResult> {
        info!("Updating cat: {}", command.cat_id);

        let mut cat = self
            .cat_repository
            .get_cat(&command.cat_id)?
            .ok_or_else(|| anyhow::anyhow!("Cat not found: {}", command.cat_id))?;

        self.validate_update_command(&command)?;

        if let Some(name) = command.name {
            cat.name = name.trim().to_string();
        }
        if let Some(breed) = command.breed {
            cat.breed = breed.trim().to_string();
        }
        if let Some(color) = command.color {
            cat.color = color.trim().to_string();
        }
        if let Some(birth_date) = command.birth_date {
            cat.birth_date = Some(
                NaiveDate::parse_from_str(&birth_date, "%Y-%m-%d")
                    .context("Invalid birth_date format in update_cat command")?,
            );
        }
        if let Some(arrival_date) = command.arrival_date {
            cat.arrival_date = Some(
                NaiveDate::parse_from_str(&arrival_date, "%Y-%m-%d")
                    .context("Invalid arrival_date format in update_cat command")?,
            );
        }
        if let Some(age) = command.age {
            cat.age = age;
        }
        if let Some(father_id) = command.father_id {
            cat.father_id = Some(father_id);
        }
        if let Some(mother_id) = command.mother_id {
            cat.mother_id = Some(mother_id);
        }
        if let Some(weight) = command.weight {
            cat.weight = weight;
        }

        cat.updated_at = Utc::now();

        self.cat_repository.update_cat(&cat)?;

        info!("Updated cat: {} with ID: {}", cat.name, cat.id);

        Ok(UpdateCatResult { cat })
    }

    /// Delete a cat and everything attached to it: health records,
    /// pregnancies and to-dos
    pub fn delete_cat(&self, command: DeleteCatCommand) -> Result<DeleteCatResult> {
        info!("Deleting cat: {}", command.cat_id);

        let cat = self
            .cat_repository
            .get_cat(&command.cat_id)?
            .ok_or_else(|| anyhow::anyhow!("Cat not found: {}", command.cat_id))?;

        let weights = self
            .weight_repository
            .delete_weight_records_for_cat(&command.cat_id)?;
        let vaccinations = self
            .vaccination_repository
            .delete_vaccinations_for_cat(&command.cat_id)?;
        let dewormings = self
            .deworming_repository
            .delete_dewormings_for_cat(&command.cat_id)?;
        let illnesses = self
            .illness_repository
            .delete_illnesses_for_cat(&command.cat_id)?;
        let pregnancies = self
            .pregnancy_repository
            .delete_pregnancies_for_cat(&command.cat_id)?;
        let todos = self.todo_repository.delete_todos_for_cat(&command.cat_id)?;

        self.cat_repository.delete_cat(&command.cat_id)?;

        info!(
            "Deleted cat {} ({}) with {} weight records, {} vaccinations, {} dewormings, {} illnesses, {} pregnancies, {} to-dos",
            cat.name, cat.id, weights, vaccinations, dewormings, illnesses, pregnancies, todos
        );

        Ok(DeleteCatResult {
            success_message: format!("Cat '{}' deleted successfully", cat.name),
        })
    }

    /// Recompute the four derived status flags from the cat's records and
    /// persist the result.
    ///
    /// The vaccinated and dewormed checks are inclusive: a record dated
    /// exactly `interval` days ago still counts as current.
    pub fn recalculate_status(&self, cat: &mut Cat) -> Result<()> {
        let settings = self.settings_repository.get_reminder_settings()?;
        let today = Local::now().date_naive();

        cat.is_pregnant = self.derive_pregnant(&cat.id)?;
        cat.is_sick = self.derive_sick(&cat.id)?;
        cat.is_vaccinated =
            self.derive_vaccinated(&cat.id, today, settings.vaccine_reminder_interval)?;
        cat.is_dewormed = self.derive_dewormed(&cat.id, today, &settings)?;

        cat.updated_at = Utc::now();
        self.cat_repository.update_cat(cat)?;

        debug!(
            "Recalculated status for {}: pregnant={}, sick={}, vaccinated={}, dewormed={}",
            cat.id, cat.is_pregnant, cat.is_sick, cat.is_vaccinated, cat.is_dewormed
        );

        Ok(())
    }

    /// Recompute status flags for every cat in the store, page by page.
    /// Returns the number of cats updated.
    pub fn recalculate_all_statuses(&self) -> Result<u32> {
        let filters = CatQueryFilters::default();
        let mut page = 1;
        let mut updated: u32 = 0;

        loop {
            let batch = self
                .cat_repository
                .get_cat_page(page, STATUS_PAGE_SIZE, &filters)?;
            let fetched = batch.cats.len() as u32;

            for mut cat in batch.cats {
                self.recalculate_status(&mut cat)?;
                updated += 1;
            }

            if fetched < STATUS_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        info!("Recalculated status flags for {} cats", updated);
        Ok(updated)
    }

    /// Pregnant while the most recent pregnancy has not been delivered
    fn derive_pregnant(&self, cat_id: &str) -> Result<bool> {
        let mut pregnancies = self.pregnancy_repository.list_pregnancies(cat_id)?;
        pregnancies.sort_by(|a, b| {
            a.mating_date
                .cmp(&b.mating_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(pregnancies.last().map(|p| !p.is_delivered).unwrap_or(false))
    }

    /// Sick while the most recent illness has not been cured
    fn derive_sick(&self, cat_id: &str) -> Result<bool> {
        let mut illnesses = self.illness_repository.list_illnesses(cat_id)?;
        illnesses.sort_by(|a, b| {
            a.illness_date
                .cmp(&b.illness_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(illnesses.last().map(|i| !i.is_cured).unwrap_or(false))
    }

    /// Vaccinated while the most recent injection is within the interval
    fn derive_vaccinated(&self, cat_id: &str, today: NaiveDate, interval: u32) -> Result<bool> {
        let mut vaccinations = self.vaccination_repository.list_vaccinations(cat_id)?;
        vaccinations.sort_by(|a, b| {
            a.injection_date
                .cmp(&b.injection_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(vaccinations
            .last()
            .map(|v| (today - v.injection_date).num_days() <= interval as i64)
            .unwrap_or(false))
    }

    /// Dewormed only while both treatments are within their intervals
    fn derive_dewormed(
        &self,
        cat_id: &str,
        today: NaiveDate,
        settings: &ReminderSettings,
    ) -> Result<bool> {
        let external_current = self.deworming_current(
            cat_id,
            DewormingKind::External,
            today,
            settings.external_deworming_interval,
        )?;
        let internal_current = self.deworming_current(
            cat_id,
            DewormingKind::Internal,
            today,
            settings.internal_deworming_interval,
        )?;
        Ok(external_current && internal_current)
    }

    fn deworming_current(
        &self,
        cat_id: &str,
        kind: DewormingKind,
        today: NaiveDate,
        interval: u32,
    ) -> Result<bool> {
        let mut dewormings = self.deworming_repository.list_dewormings(cat_id, kind)?;
        dewormings.sort_by(|a, b| {
            a.deworm_date
                .cmp(&b.deworm_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(dewormings
            .last()
            .map(|d| (today - d.deworm_date).num_days() <= interval as i64)
            .unwrap_or(false))
    }

    /// Validate create cat command
    fn validate_create_command(&self, command: &CreateCatCommand) -> Result<()> {
        if command.name.trim().is_empty() {
            return Err(CatValidationError::EmptyName.into());
        }
        if command.name.len() > 100 {
            return Err(CatValidationError::NameTooLong.into());
        }
        if command.weight < 0.0 {
            return Err(CatValidationError::NegativeWeight.into());
        }
        if let Some(age) = command.age {
            if age < 0 {
                return Err(CatValidationError::NegativeAge.into());
            }
        }
        Ok(())
    }

    /// Validate update cat command
    fn validate_update_command(&self, command: &UpdateCatCommand) -> Result<()> {
        if let Some(ref name) = command.name {
            if name.trim().is_empty() {
                return Err(CatValidationError::EmptyName.into());
            }
            if name.len() > 100 {
                return Err(CatValidationError::NameTooLong.into());
            }
        }
        if let Some(weight) = command.weight {
            if weight < 0.0 {
                return Err(CatValidationError::NegativeWeight.into());
            }
        }
        if let Some(age) = command.age {
            if age < 0 {
                return Err(CatValidationError::NegativeAge.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::health::{DewormingRecord, IllnessRecord, VaccinationRecord};
    use crate::domain::models::pregnancy::PregnancyRecord;
    use crate::storage::csv::test_utils::TestEnvironment;
    use chrono::Duration;

    fn setup_test() -> (CatService, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let service = CatService::new(Arc::new(env.connection.clone()));
        (service, env)
    }

    fn create_cat(service: &CatService, name: &str) -> Cat {
        let command = CreateCatCommand {
            name: name.to_string(),
            breed: "Ragdoll".to_string(),
            color: "Blue point".to_string(),
            birth_date: Some("2023-04-01".to_string()),
            arrival_date: Some("2023-06-01".to_string()),
            age: Some(1),
            father_id: None,
            mother_id: None,
            weight: 3.5,
        };
        service.create_cat(command).unwrap().cat
    }

    fn days_ago(days: i64) -> NaiveDate {
        Local::now().date_naive() - Duration::days(days)
    }

    #[test]
    fn test_create_cat_trims_and_stores() {
        let (service, _env) = setup_test();
        let command = CreateCatCommand {
            name: "  Momo ".to_string(),
            breed: "Ragdoll".to_string(),
            color: "Seal point".to_string(),
            birth_date: Some("2023-04-01".to_string()),
            arrival_date: None,
            age: Some(2),
            father_id: None,
            mother_id: None,
            weight: 4.0,
        };

        let result = service.create_cat(command).unwrap();
        assert_eq!(result.cat.name, "Momo");
        assert_eq!(result.cat.age, 2);
        assert!(!result.cat.is_pregnant);
        assert!(result.cat.id.starts_with("cat::"));
    }

    #[test]
    fn test_create_cat_validation() {
        let (service, _env) = setup_test();

        let base = CreateCatCommand {
            name: "Momo".to_string(),
            breed: "Ragdoll".to_string(),
            color: "Seal point".to_string(),
            birth_date: None,
            arrival_date: None,
            age: None,
            father_id: None,
            mother_id: None,
            weight: 4.0,
        };

        let mut empty_name = base.clone();
        empty_name.name = "  ".to_string();
        assert!(service.create_cat(empty_name).is_err());

        let mut long_name = base.clone();
        long_name.name = "a".repeat(101);
        assert!(service.create_cat(long_name).is_err());

        let mut negative_weight = base.clone();
        negative_weight.weight = -0.5;
        assert!(service.create_cat(negative_weight).is_err());

        let mut negative_age = base.clone();
        negative_age.age = Some(-1);
        assert!(service.create_cat(negative_age).is_err());

        let mut bad_date = base;
        bad_date.birth_date = Some("2023/04/01".to_string());
        assert!(service.create_cat(bad_date).is_err());
    }

    #[test]
    fn test_create_cat_derives_age_from_birth_date() {
        let (service, _env) = setup_test();
        let birth = days_ago(365 * 3 + 30);
        let command = CreateCatCommand {
            name: "Momo".to_string(),
            breed: "Ragdoll".to_string(),
            color: "Seal point".to_string(),
            birth_date: Some(birth.format("%Y-%m-%d").to_string()),
            arrival_date: None,
            age: None,
            father_id: None,
            mother_id: None,
            weight: 4.0,
        };

        let result = service.create_cat(command).unwrap();
        assert_eq!(result.cat.age, 3);
    }

    #[test]
    fn test_get_and_list_cats() {
        let (service, _env) = setup_test();
        let momo = create_cat(&service, "Momo");
        create_cat(&service, "Wasabi");

        let fetched = service
            .get_cat(GetCatCommand {
                cat_id: momo.id.clone(),
            })
            .unwrap();
        assert_eq!(fetched.cat.unwrap().name, "Momo");

        let missing = service
            .get_cat(GetCatCommand {
                cat_id: "cat::0".to_string(),
            })
            .unwrap();
        assert!(missing.cat.is_none());

        let all = service.list_cats().unwrap();
        assert_eq!(all.cats.len(), 2);
    }

    #[test]
    fn test_update_cat_applies_only_provided_fields() {
        let (service, _env) = setup_test();
        let cat = create_cat(&service, "Momo");

        let result = service
            .update_cat(UpdateCatCommand {
                cat_id: cat.id.clone(),
                weight: Some(4.8),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(result.cat.weight, 4.8);
        assert_eq!(result.cat.name, "Momo");
        assert_eq!(result.cat.breed, "Ragdoll");
    }

    #[test]
    fn test_update_missing_cat_fails() {
        let (service, _env) = setup_test();
        let result = service.update_cat(UpdateCatCommand {
            cat_id: "cat::0".to_string(),
            name: Some("Ghost".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_cat_cascades_into_related_collections() {
        let (service, env) = setup_test();
        let cat = create_cat(&service, "Momo");
        let conn = Arc::new(env.connection.clone());

        let weight_repo = WeightRepository::new(conn.clone());
        weight_repo
            .store_weight_record(&crate::domain::models::health::WeightRecord {
                id: "w1".to_string(),
                cat_id: cat.id.clone(),
                weight: 4.0,
                weigh_date: days_ago(3),
                created_at: Utc::now(),
            })
            .unwrap();

        let todo_repo = TodoRepository::new(conn.clone());
        todo_repo
            .store_todo(&crate::domain::models::todo::Todo {
                id: "t1".to_string(),
                cat_id: cat.id.clone(),
                kind: crate::domain::models::todo::ReminderKind::Weight,
                content: "[称重提醒] Momo 需要称重了".to_string(),
                status: crate::domain::models::todo::TodoStatus::Pending,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();

        service
            .delete_cat(DeleteCatCommand {
                cat_id: cat.id.clone(),
            })
            .unwrap();

        assert!(service
            .get_cat(GetCatCommand {
                cat_id: cat.id.clone()
            })
            .unwrap()
            .cat
            .is_none());
        assert!(weight_repo.list_weight_records(&cat.id).unwrap().is_empty());
        assert!(todo_repo.list_todos_for_cat(&cat.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_cat_fails() {
        let (service, _env) = setup_test();
        let result = service.delete_cat(DeleteCatCommand {
            cat_id: "cat::0".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_pregnancy_flag_follows_delivery_state() {
        let (service, env) = setup_test();
        let mut cat = create_cat(&service, "Momo");
        let pregnancy_repo = PregnancyRepository::new(Arc::new(env.connection.clone()));

        let mating = days_ago(30);
        let schedule = PregnancyRecord::schedule_from_mating(mating, 63);
        let mut pregnancy = PregnancyRecord {
            id: "p1".to_string(),
            cat_id: cat.id.clone(),
            male_cat_id: None,
            mating_date: mating,
            expected_delivery_date: schedule.expected_delivery_date,
            reminder_7_days: schedule.reminder_7_days,
            reminder_3_days: schedule.reminder_3_days,
            reminder_1_day: schedule.reminder_1_day,
            is_delivered: false,
            delivery_count: None,
            notes: None,
            created_at: Utc::now(),
        };
        pregnancy_repo.store_pregnancy(&pregnancy).unwrap();

        service.recalculate_status(&mut cat).unwrap();
        assert!(cat.is_pregnant);

        pregnancy.is_delivered = true;
        pregnancy.delivery_count = Some(3);
        pregnancy_repo.update_pregnancy(&pregnancy).unwrap();

        service.recalculate_status(&mut cat).unwrap();
        assert!(!cat.is_pregnant);
    }

    #[test]
    fn test_sick_flag_follows_most_recent_illness() {
        let (service, env) = setup_test();
        let mut cat = create_cat(&service, "Momo");
        let illness_repo = IllnessRepository::new(Arc::new(env.connection.clone()));

        // An old cured illness followed by a current one
        illness_repo
            .store_illness(&IllnessRecord {
                id: "i1".to_string(),
                cat_id: cat.id.clone(),
                illness_name: "感冒".to_string(),
                illness_date: days_ago(60),
                is_cured: true,
                created_at: Utc::now(),
            })
            .unwrap();
        illness_repo
            .store_illness(&IllnessRecord {
                id: "i2".to_string(),
                cat_id: cat.id.clone(),
                illness_name: "猫藓".to_string(),
                illness_date: days_ago(2),
                is_cured: false,
                created_at: Utc::now(),
            })
            .unwrap();

        service.recalculate_status(&mut cat).unwrap();
        assert!(cat.is_sick);
    }

    #[test]
    fn test_vaccinated_boundary_is_inclusive() {
        let (service, env) = setup_test();
        let mut cat = create_cat(&service, "Momo");
        let vaccination_repo = VaccinationRepository::new(Arc::new(env.connection.clone()));

        // Default interval is 365 days; a record dated exactly 365 days ago
        // still counts as current
        vaccination_repo
            .store_vaccination(&VaccinationRecord {
                id: "v1".to_string(),
                cat_id: cat.id.clone(),
                brand: "妙三多".to_string(),
                injection_date: days_ago(365),
                created_at: Utc::now(),
            })
            .unwrap();

        service.recalculate_status(&mut cat).unwrap();
        assert!(cat.is_vaccinated);

        vaccination_repo.delete_vaccination("v1").unwrap();
        vaccination_repo
            .store_vaccination(&VaccinationRecord {
                id: "v2".to_string(),
                cat_id: cat.id.clone(),
                brand: "妙三多".to_string(),
                injection_date: days_ago(366),
                created_at: Utc::now(),
            })
            .unwrap();

        service.recalculate_status(&mut cat).unwrap();
        assert!(!cat.is_vaccinated);
    }

    #[test]
    fn test_dewormed_requires_both_treatments_current() {
        let (service, env) = setup_test();
        let mut cat = create_cat(&service, "Momo");
        let deworming_repo = DewormingRepository::new(Arc::new(env.connection.clone()));

        deworming_repo
            .store_deworming(&DewormingRecord {
                id: "d1".to_string(),
                cat_id: cat.id.clone(),
                kind: DewormingKind::External,
                brand: "福来恩".to_string(),
                deworm_date: days_ago(10),
                created_at: Utc::now(),
            })
            .unwrap();

        service.recalculate_status(&mut cat).unwrap();
        assert!(!cat.is_dewormed);

        deworming_repo
            .store_deworming(&DewormingRecord {
                id: "d2".to_string(),
                cat_id: cat.id.clone(),
                kind: DewormingKind::Internal,
                brand: "海乐妙".to_string(),
                deworm_date: days_ago(20),
                created_at: Utc::now(),
            })
            .unwrap();

        service.recalculate_status(&mut cat).unwrap();
        assert!(cat.is_dewormed);
    }

    #[test]
    fn test_flags_false_without_records() {
        let (service, _env) = setup_test();
        let mut cat = create_cat(&service, "Momo");

        service.recalculate_status(&mut cat).unwrap();

        assert!(!cat.is_pregnant);
        assert!(!cat.is_sick);
        assert!(!cat.is_vaccinated);
        assert!(!cat.is_dewormed);
    }

    #[test]
    fn test_recalculate_all_statuses_walks_every_page() {
        let (service, _env) = setup_test();

        // More cats than one page so the loop has to fetch a second one
        for i in 0..101 {
            create_cat(&service, &format!("Cat {}", i));
        }

        let updated = service.recalculate_all_statuses().unwrap();
        assert_eq!(updated, 101);
    }

    #[test]
    fn test_recalculated_flags_are_persisted() {
        let (service, env) = setup_test();
        let mut cat = create_cat(&service, "Momo");
        let vaccination_repo = VaccinationRepository::new(Arc::new(env.connection.clone()));

        vaccination_repo
            .store_vaccination(&VaccinationRecord {
                id: "v1".to_string(),
                cat_id: cat.id.clone(),
                brand: "妙三多".to_string(),
                injection_date: days_ago(1),
                created_at: Utc::now(),
            })
            .unwrap();

        service.recalculate_status(&mut cat).unwrap();

        let stored = service
            .get_cat(GetCatCommand {
                cat_id: cat.id.clone(),
            })
            .unwrap()
            .cat
            .unwrap();
        assert!(stored.is_vaccinated);
    }
}
