use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::commands::records::{
    AddDewormingCommand, AddDewormingResult, AddIllnessCommand, AddIllnessResult,
    AddPregnancyCommand, AddPregnancyResult, AddVaccinationCommand, AddVaccinationResult,
    AddWeightCommand, AddWeightResult, MarkIllnessCuredCommand, MarkIllnessCuredResult,
    RecordDeliveryCommand, RecordDeliveryResult,
};
use crate::domain::models::cat::Cat;
use crate::domain::models::health::{
    DewormingKind, DewormingRecord, IllnessRecord, VaccinationRecord, WeightRecord,
};
use crate::domain::models::pregnancy::PregnancyRecord;
use crate::storage::csv::{
    CatRepository, CsvConnection, DewormingRepository, IllnessRepository, PregnancyRepository,
    SettingsRepository, SettingsStorage, VaccinationRepository, WeightRepository,
};
use crate::storage::traits::{
    CatStorage, DewormingStorage, IllnessStorage, PregnancyStorage, VaccinationStorage,
    WeightStorage,
};

/// Service for the health and breeding history of individual cats: weighings,
/// vaccinations, dewormings, illnesses and pregnancies.
///
/// Every add validates that the referenced cat exists. The derived status
/// flags are not touched here; they catch up on the next reminder pass.
#[derive(Clone)]
pub struct RecordService {
    cat_repository: CatRepository,
    weight_repository: WeightRepository,
    vaccination_repository: VaccinationRepository,
    deworming_repository: DewormingRepository,
    illness_repository: IllnessRepository,
    pregnancy_repository: PregnancyRepository,
    settings_repository: SettingsRepository,
}

impl RecordService {
    /// Create a new RecordService
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        Self {
            cat_repository: CatRepository::new(csv_conn.clone()),
            weight_repository: WeightRepository::new(csv_conn.clone()),
            vaccination_repository: VaccinationRepository::new(csv_conn.clone()),
            deworming_repository: DewormingRepository::new(csv_conn.clone()),
            illness_repository: IllnessRepository::new(csv_conn.clone()),
            pregnancy_repository: PregnancyRepository::new(csv_conn.clone()),
            settings_repository: SettingsRepository::new(csv_conn),
        }
    }

    /// Record a weighing. The date defaults to today when omitted.
    pub fn add_weight(&self, command: AddWeightCommand) -> Result<AddWeightResult> {
        let cat = self.require_cat(&command.cat_id)?;
        if command.weight <= 0.0 {
            return Err(anyhow::anyhow!("Weight must be positive"));
        }
        let weigh_date = parse_date_or_today(command.weigh_date.as_deref(), "weigh_date")?;

        let now = Utc::now();
        let record = WeightRecord {
            id: WeightRecord::generate_id(now.timestamp_millis() as u64),
            cat_id: cat.id,
            weight: command.weight,
            weigh_date,
            created_at: now,
        };
        self.weight_repository.store_weight_record(&record)?;

        info!(
            "Recorded weight {}kg for {} on {}",
            record.weight, record.cat_id, record.weigh_date
        );
        Ok(AddWeightResult { record })
    }

    /// Record a vaccine injection
    pub fn add_vaccination(&self, command: AddVaccinationCommand) -> Result<AddVaccinationResult> {
        let cat = self.require_cat(&command.cat_id)?;
        if command.brand.trim().is_empty() {
            return Err(anyhow::anyhow!("Vaccine brand cannot be empty"));
        }
        let injection_date =
            parse_date_or_today(command.injection_date.as_deref(), "injection_date")?;

        let now = Utc::now();
        let record = VaccinationRecord {
            id: VaccinationRecord::generate_id(now.timestamp_millis() as u64),
            cat_id: cat.id,
            brand: command.brand.trim().to_string(),
            injection_date,
            created_at: now,
        };
        self.vaccination_repository.store_vaccination(&record)?;

        info!(
            "Recorded vaccination ({}) for {} on {}",
            record.brand, record.cat_id, record.injection_date
        );
        Ok(AddVaccinationResult { record })
    }

    /// Record a deworming treatment of either kind
    pub fn add_deworming(&self, command: AddDewormingCommand) -> Result<AddDewormingResult> {
        let cat = self.require_cat(&command.cat_id)?;
        if command.brand.trim().is_empty() {
            return Err(anyhow::anyhow!("Deworming brand cannot be empty"));
        }
        let deworm_date = parse_date_or_today(command.deworm_date.as_deref(), "deworm_date")?;

        let now = Utc::now();
        let record = DewormingRecord {
            id: DewormingRecord::generate_id(now.timestamp_millis() as u64),
            cat_id: cat.id,
            kind: command.kind,
            brand: command.brand.trim().to_string(),
            deworm_date,
            created_at: now,
        };
        self.deworming_repository.store_deworming(&record)?;

        info!(
            "Recorded {:?} deworming ({}) for {} on {}",
            record.kind, record.brand, record.cat_id, record.deworm_date
        );
        Ok(AddDewormingResult { record })
    }

    /// Record an illness. New illnesses start uncured.
    pub fn add_illness(&self, command: AddIllnessCommand) -> Result<AddIllnessResult> {
        let cat = self.require_cat(&command.cat_id)?;
        if command.illness_name.trim().is_empty() {
            return Err(anyhow::anyhow!("Illness name cannot be empty"));
        }
        let illness_date = parse_date_or_today(command.illness_date.as_deref(), "illness_date")?;

        let now = Utc::now();
        let record = IllnessRecord {
            id: IllnessRecord::generate_id(now.timestamp_millis() as u64),
            cat_id: cat.id,
            illness_name: command.illness_name.trim().to_string(),
            illness_date,
            is_cured: false,
            created_at: now,
        };
        self.illness_repository.store_illness(&record)?;

        info!(
            "Recorded illness ({}) for {} on {}",
            record.illness_name, record.cat_id, record.illness_date
        );
        Ok(AddIllnessResult { record })
    }

    /// Mark an illness as cured
    pub fn mark_illness_cured(
        &self,
        command: MarkIllnessCuredCommand,
    ) -> Result<MarkIllnessCuredResult> {
        let mut record = self
            .illness_repository
            .get_illness(&command.illness_id)?
            .ok_or_else(|| anyhow::anyhow!("Illness record not found: {}", command.illness_id))?;

        record.is_cured = true;
        self.illness_repository.update_illness(&record)?;

        info!("Marked illness {} as cured", record.id);
        Ok(MarkIllnessCuredResult { record })
    }

    /// Record a pregnancy. The expected delivery date and the three countdown
    /// markers are derived here, once, from the configured gestation length;
    /// later settings changes do not move existing schedules.
    pub fn add_pregnancy(&self, command: AddPregnancyCommand) -> Result<AddPregnancyResult> {
        let cat = self.require_cat(&command.cat_id)?;

        if let Some(ref male_cat_id) = command.male_cat_id {
            if self.cat_repository.get_cat(male_cat_id)?.is_none() {
                warn!(
                    "Mating partner {} not found, recording pregnancy for {} anyway",
                    male_cat_id, cat.id
                );
            }
        }

        let mating_date = NaiveDate::parse_from_str(&command.mating_date, "%Y-%m-%d")
            .context("Invalid mating_date format in add_pregnancy command")?;

        let settings = self.settings_repository.get_pregnancy_settings()?;
        let schedule =
            PregnancyRecord::schedule_from_mating(mating_date, settings.pregnancy_duration as i64);

        let now = Utc::now();
        let record = PregnancyRecord {
            id: PregnancyRecord::generate_id(now.timestamp_millis() as u64),
            cat_id: cat.id,
            male_cat_id: command.male_cat_id,
            mating_date,
            expected_delivery_date: schedule.expected_delivery_date,
            reminder_7_days: schedule.reminder_7_days,
            reminder_3_days: schedule.reminder_3_days,
            reminder_1_day: schedule.reminder_1_day,
            is_delivered: false,
            delivery_count: None,
            notes: command.notes,
            created_at: now,
        };
        self.pregnancy_repository.store_pregnancy(&record)?;

        info!(
            "Recorded pregnancy for {}, delivery expected {}",
            record.cat_id, record.expected_delivery_date
        );
        Ok(AddPregnancyResult { record })
    }

    /// Record a delivery on a pregnancy
    pub fn record_delivery(&self, command: RecordDeliveryCommand) -> Result<RecordDeliveryResult> {
        let mut record = self
            .pregnancy_repository
            .get_pregnancy(&command.pregnancy_id)?
            .ok_or_else(|| {
                anyhow::anyhow!("Pregnancy record not found: {}", command.pregnancy_id)
            })?;

        record.is_delivered = true;
        record.delivery_count = Some(command.delivery_count);
        self.pregnancy_repository.update_pregnancy(&record)?;

        info!(
            "Recorded delivery of {} kittens on pregnancy {}",
            command.delivery_count, record.id
        );
        Ok(RecordDeliveryResult { record })
    }

    /// List all weighings for a cat, oldest first
    pub fn list_weight_records_for_cat(&self, cat_id: &str) -> Result<Vec<WeightRecord>> {
        self.weight_repository.list_weight_records(cat_id)
    }

    /// List all vaccinations for a cat, oldest first
    pub fn list_vaccinations_for_cat(&self, cat_id: &str) -> Result<Vec<VaccinationRecord>> {
        self.vaccination_repository.list_vaccinations(cat_id)
    }

    /// List all dewormings of one kind for a cat, oldest first
    pub fn list_dewormings_for_cat(
        &self,
        cat_id: &str,
        kind: DewormingKind,
    ) -> Result<Vec<DewormingRecord>> {
        self.deworming_repository.list_dewormings(cat_id, kind)
    }

    /// List all illnesses for a cat, oldest first
    pub fn list_illnesses_for_cat(&self, cat_id: &str) -> Result<Vec<IllnessRecord>> {
        self.illness_repository.list_illnesses(cat_id)
    }

    /// List all pregnancies for a cat, oldest first
    pub fn list_pregnancies_for_cat(&self, cat_id: &str) -> Result<Vec<PregnancyRecord>> {
        self.pregnancy_repository.list_pregnancies(cat_id)
    }

    /// Delete a single weight record
    pub fn delete_weight_record(&self, record_id: &str) -> Result<()> {
        if !self.weight_repository.delete_weight_record(record_id)? {
            return Err(anyhow::anyhow!("Weight record not found: {}", record_id));
        }
        info!("Deleted weight record {}", record_id);
        Ok(())
    }

    /// Delete a single vaccination record
    pub fn delete_vaccination(&self, record_id: &str) -> Result<()> {
        if !self.vaccination_repository.delete_vaccination(record_id)? {
            return Err(anyhow::anyhow!(
                "Vaccination record not found: {}",
                record_id
            ));
        }
        info!("Deleted vaccination record {}", record_id);
        Ok(())
    }

    /// Delete a single deworming record of the given kind
    pub fn delete_deworming(&self, kind: DewormingKind, record_id: &str) -> Result<()> {
        if !self.deworming_repository.delete_deworming(kind, record_id)? {
            return Err(anyhow::anyhow!(
                "{:?} deworming record not found: {}",
                kind,
                record_id
            ));
        }
        info!("Deleted {:?} deworming record {}", kind, record_id);
        Ok(())
    }

    /// Delete a single illness record
    pub fn delete_illness(&self, record_id: &str) -> Result<()> {
        if !self.illness_repository.delete_illness(record_id)? {
            return Err(anyhow::anyhow!("Illness record not found: {}", record_id));
        }
        info!("Deleted illness record {}", record_id);
        Ok(())
    }

    /// Delete a single pregnancy record
    pub fn delete_pregnancy(&self, record_id: &str) -> Result<()> {
        if !self.pregnancy_repository.delete_pregnancy(record_id)? {
            return Err(anyhow::anyhow!("Pregnancy record not found: {}", record_id));
        }
        info!("Deleted pregnancy record {}", record_id);
        Ok(())
    }

    fn require_cat(&self, cat_id: &str) -> Result<Cat> {
        self.cat_repository
            .get_cat(cat_id)?
            .ok_or_else(|| anyhow::anyhow!("Cat not found: {}", cat_id))
    }
}

fn parse_date_or_today(value: Option<&str>, field: &str) -> Result<NaiveDate> {
    match value {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid {} format, expected YYYY-MM-DD", field)),
        None => Ok(Local::now().date_naive()),
    }
}
