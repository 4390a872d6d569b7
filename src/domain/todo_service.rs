use anyhow::Result;
use chrono::{Local, Months, NaiveDate, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::cat_service::CatService;
use crate::domain::commands::todos::{
    CompleteTodoCommand, CompleteTodoResult, GetPendingTodosResult,
};
use crate::domain::models::cat::{Cat, CatQueryFilters};
use crate::domain::models::health::{
    DewormingKind, DewormingRecord, VaccinationRecord, WeightRecord,
};
use crate::domain::models::pregnancy::PregnancyRecord;
use crate::domain::models::settings::{PregnancySettings, ReminderSettings};
use crate::domain::models::todo::{PregnancyThreshold, ReminderKind, Todo, TodoStatus};
use crate::storage::csv::{
    CatRepository, CsvConnection, DewormingRepository, PregnancyRepository, SettingsRepository,
    SettingsStorage, TodoRepository, VaccinationRepository, WeightRepository,
};
use crate::storage::traits::{
    CatStorage, DewormingStorage, PregnancyStorage, TodoStorage, VaccinationStorage, WeightStorage,
};

/// Page size used when walking the whole cattery.
const REMINDER_PAGE_SIZE: u32 = 100;

/// Brands written onto records synthesized for cats whose flags say a
/// treatment happened but no record of it exists.
const INITIAL_VACCINE_BRAND: &str = "初始疫苗";
const INITIAL_EXTERNAL_DEWORM_BRAND: &str = "初始体外驱虫";
const INITIAL_INTERNAL_DEWORM_BRAND: &str = "初始体内驱虫";

/// Releases the in-flight flag when a reminder pass ends, including early
/// returns through `?`.
struct ProcessingGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// The reminder engine: derives pending to-do items from each cat's health
/// records and the configured intervals.
///
/// A full pass first recomputes every cat's status flags, then evaluates the
/// reminder rules per cat. Passes are serialized by an in-flight flag; an
/// overlapping call logs and returns without queuing.
#[derive(Clone)]
pub struct TodoService {
    cat_service: CatService,
    cat_repository: CatRepository,
    weight_repository: WeightRepository,
    vaccination_repository: VaccinationRepository,
    deworming_repository: DewormingRepository,
    pregnancy_repository: PregnancyRepository,
    todo_repository: TodoRepository,
    settings_repository: SettingsRepository,
    processing: Arc<AtomicBool>,
}

impl TodoService {
    /// Create a new TodoService
    pub fn new(csv_conn: Arc<CsvConnection>, cat_service: CatService) -> Self {
        Self {
            cat_service,
            cat_repository: CatRepository::new(csv_conn.clone()),
            weight_repository: WeightRepository::new(csv_conn.clone()),
            vaccination_repository: VaccinationRepository::new(csv_conn.clone()),
            deworming_repository: DewormingRepository::new(csv_conn.clone()),
            pregnancy_repository: PregnancyRepository::new(csv_conn.clone()),
            todo_repository: TodoRepository::new(csv_conn.clone()),
            settings_repository: SettingsRepository::new(csv_conn),
            processing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run a full reminder pass, then return every pending to-do.
    ///
    /// Not free of side effects: each call can create new to-dos and
    /// synthesize initial health records.
    pub fn get_pending_todos(&self) -> Result<GetPendingTodosResult> {
        self.process_all_todos()?;

        let todos = self.todo_repository.list_pending_todos()?;
        debug!("Found {} pending to-dos", todos.len());

        Ok(GetPendingTodosResult { todos })
    }

    /// Mark a to-do as completed. Completed items are kept for history and
    /// no longer suppress duplicates, so an unresolved reminder fires again
    /// on the next pass.
    pub fn complete_todo(&self, command: CompleteTodoCommand) -> Result<CompleteTodoResult> {
        let mut todo = self
            .todo_repository
            .get_todo(&command.todo_id)?
            .ok_or_else(|| anyhow::anyhow!("To-do not found: {}", command.todo_id))?;

        todo.status = TodoStatus::Completed;
        todo.updated_at = Utc::now();
        self.todo_repository.update_todo(&todo)?;

        info!("Completed to-do: {}", todo.id);

        Ok(CompleteTodoResult { todo })
    }

    /// Evaluate the reminder rules for every cat in the cattery.
    ///
    /// Only one pass runs at a time: an overlapping call is dropped, not
    /// queued, so its caller may read the pending list before the running
    /// pass has written everything.
    pub fn process_all_todos(&self) -> Result<()> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("A reminder pass is already running, skipping this one");
            return Ok(());
        }
        let _guard = ProcessingGuard {
            flag: self.processing.clone(),
        };

        info!("Starting reminder pass");

        // Flags feed the synthesis branches below, so bring them up to date
        // with the records first
        self.cat_service.recalculate_all_statuses()?;

        let reminder_settings = self.settings_repository.get_reminder_settings()?;
        let pregnancy_settings = self.settings_repository.get_pregnancy_settings()?;
        let today = Local::now().date_naive();

        let filters = CatQueryFilters::default();
        let mut page = 1;
        let mut processed: u32 = 0;

        loop {
            let batch = self
                .cat_repository
                .get_cat_page(page, REMINDER_PAGE_SIZE, &filters)?;
            let fetched = batch.cats.len() as u32;

            for cat in &batch.cats {
                debug!("Evaluating reminders for {} ({})", cat.name, cat.id);
                self.process_cat_todos(cat, &reminder_settings, &pregnancy_settings, today)?;
                processed += 1;
            }

            if fetched < REMINDER_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        info!("Reminder pass finished, {} cats evaluated", processed);
        Ok(())
    }

    /// Evaluate all reminder rules for one cat.
    fn process_cat_todos(
        &self,
        cat: &Cat,
        reminder_settings: &ReminderSettings,
        pregnancy_settings: &PregnancySettings,
        today: NaiveDate,
    ) -> Result<()> {
        self.check_age_reminder(cat, reminder_settings.age_reminder_interval, today)?;
        self.check_weight_reminders(cat, reminder_settings.weight_reminder_interval, today)?;
        self.check_vaccine_reminder(cat, reminder_settings.vaccine_reminder_interval, today)?;
        self.check_deworm_reminder(
            cat,
            DewormingKind::External,
            reminder_settings.external_deworming_interval,
            today,
        )?;
        self.check_deworm_reminder(
            cat,
            DewormingKind::Internal,
            reminder_settings.internal_deworming_interval,
            today,
        )?;

        if cat.is_pregnant && pregnancy_settings.enable_reminders {
            self.check_pregnancy_reminders(cat, today)?;
        }

        Ok(())
    }

    /// Fires when the next birthday is at most `interval` days away. A
    /// birthday that already passed (stale `age` field) fires as well.
    fn check_age_reminder(&self, cat: &Cat, interval: u32, today: NaiveDate) -> Result<()> {
        let birth_date = match cat.birth_date {
            Some(date) => date,
            None => return Ok(()),
        };

        let next_age = cat.age + 1;
        let months = Months::new((next_age.max(0) as u32).saturating_mul(12));
        let next_birthday = match birth_date.checked_add_months(months) {
            Some(date) => date,
            None => {
                warn!(
                    "Next birthday for {} is out of range, skipping age reminder",
                    cat.id
                );
                return Ok(());
            }
        };

        let days_until = (next_birthday - today).num_days();
        if days_until <= interval as i64 {
            self.create_todo(
                &cat.id,
                ReminderKind::Age,
                format!(
                    "[年龄提醒] {} 即将迎来 {} 岁生日，预计日期：{}",
                    cat.name,
                    next_age,
                    next_birthday.format("%Y-%m-%d")
                ),
            )?;
        }

        Ok(())
    }

    /// A cat with no weight records either gets an initial record synthesized
    /// from its profile weight or, lacking that too, a first-time reminder.
    /// With records present the interval and stagnation rules apply.
    fn check_weight_reminders(&self, cat: &Cat, interval: u32, today: NaiveDate) -> Result<()> {
        let records = self.list_weight_records_sorted(&cat.id)?;

        if records.is_empty() {
            if cat.weight > 0.0 {
                if !self.cat_still_exists(&cat.id)? {
                    return Ok(());
                }
                let now = Utc::now();
                let record = WeightRecord {
                    id: WeightRecord::generate_id(now.timestamp_millis() as u64),
                    cat_id: cat.id.clone(),
                    weight: cat.weight,
                    weigh_date: today,
                    created_at: now,
                };
                self.weight_repository.store_weight_record(&record)?;
                info!(
                    "Synthesized initial weight record for {} at {}kg",
                    cat.name, cat.weight
                );
                return self.check_recurring_weight(cat, interval, today);
            }

            return self.create_todo(
                &cat.id,
                ReminderKind::Weight,
                format!("[称重提醒] {} 需要称重了，这是首次称重", cat.name),
            );
        }

        self.check_recurring_weight(cat, interval, today)
    }

    fn check_recurring_weight(&self, cat: &Cat, interval: u32, today: NaiveDate) -> Result<()> {
        let records = self.list_weight_records_sorted(&cat.id)?;
        let last = match records.last() {
            Some(record) => record,
            None => return Ok(()),
        };

        // Strictly overdue only: a record dated exactly `interval` days ago
        // does not fire
        if (today - last.weigh_date).num_days() > interval as i64 {
            self.create_todo(
                &cat.id,
                ReminderKind::Weight,
                format!(
                    "[称重提醒] {} 需要称重了，上次称重时间：{}",
                    cat.name,
                    last.weigh_date.format("%Y-%m-%d")
                ),
            )?;
        }

        // Independent of the interval rule
        if records.len() >= 2 {
            let latest = records[records.len() - 1].weight;
            let previous = records[records.len() - 2].weight;
            if latest <= previous {
                self.create_todo(
                    &cat.id,
                    ReminderKind::WeightStagnation,
                    format!(
                        "[体重不增加提醒] {} 的体重没有增加，请关注。上次体重：{}kg，上上次体重：{}kg",
                        cat.name, latest, previous
                    ),
                )?;
            }
        }

        Ok(())
    }

    /// Same existence/synthesis pattern as weight, keyed off `is_vaccinated`.
    fn check_vaccine_reminder(&self, cat: &Cat, interval: u32, today: NaiveDate) -> Result<()> {
        let vaccinations = self.list_vaccinations_sorted(&cat.id)?;

        if vaccinations.is_empty() {
            if cat.is_vaccinated {
                if !self.cat_still_exists(&cat.id)? {
                    return Ok(());
                }
                let now = Utc::now();
                let record = VaccinationRecord {
                    id: VaccinationRecord::generate_id(now.timestamp_millis() as u64),
                    cat_id: cat.id.clone(),
                    brand: INITIAL_VACCINE_BRAND.to_string(),
                    injection_date: today,
                    created_at: now,
                };
                self.vaccination_repository.store_vaccination(&record)?;
                info!("Synthesized initial vaccination record for {}", cat.name);
                return self.check_recurring_vaccine(cat, interval, today);
            }

            return self.create_todo(
                &cat.id,
                ReminderKind::Vaccine,
                format!("[疫苗提醒] {} 需要注射疫苗了，这是首次接种", cat.name),
            );
        }

        self.check_recurring_vaccine(cat, interval, today)
    }

    fn check_recurring_vaccine(&self, cat: &Cat, interval: u32, today: NaiveDate) -> Result<()> {
        let vaccinations = self.list_vaccinations_sorted(&cat.id)?;
        let last = match vaccinations.last() {
            Some(record) => record,
            None => return Ok(()),
        };

        if (today - last.injection_date).num_days() > interval as i64 {
            self.create_todo(
                &cat.id,
                ReminderKind::Vaccine,
                format!(
                    "[疫苗提醒] {} 需要注射疫苗了，上次注射时间：{}",
                    cat.name,
                    last.injection_date.format("%Y-%m-%d")
                ),
            )?;
        }

        Ok(())
    }

    /// External and internal deworming are evaluated independently with the
    /// same existence/synthesis pattern, keyed off `is_dewormed`.
    fn check_deworm_reminder(
        &self,
        cat: &Cat,
        kind: DewormingKind,
        interval: u32,
        today: NaiveDate,
    ) -> Result<()> {
        let dewormings = self.list_dewormings_sorted(&cat.id, kind)?;

        if dewormings.is_empty() {
            if cat.is_dewormed {
                if !self.cat_still_exists(&cat.id)? {
                    return Ok(());
                }
                let now = Utc::now();
                let record = DewormingRecord {
                    id: DewormingRecord::generate_id(now.timestamp_millis() as u64),
                    cat_id: cat.id.clone(),
                    kind,
                    brand: initial_deworm_brand(kind).to_string(),
                    deworm_date: today,
                    created_at: now,
                };
                self.deworming_repository.store_deworming(&record)?;
                info!(
                    "Synthesized initial {:?} deworming record for {}",
                    kind, cat.name
                );
                return self.check_recurring_deworm(cat, kind, interval, today);
            }

            return self.create_todo(
                &cat.id,
                deworm_reminder_kind(kind),
                format!(
                    "[{}提醒] {} 需要进行{}了，这是首次驱虫",
                    deworm_label(kind),
                    cat.name,
                    deworm_label(kind)
                ),
            );
        }

        self.check_recurring_deworm(cat, kind, interval, today)
    }

    fn check_recurring_deworm(
        &self,
        cat: &Cat,
        kind: DewormingKind,
        interval: u32,
        today: NaiveDate,
    ) -> Result<()> {
        let dewormings = self.list_dewormings_sorted(&cat.id, kind)?;
        let last = match dewormings.last() {
            Some(record) => record,
            None => return Ok(()),
        };

        if (today - last.deworm_date).num_days() > interval as i64 {
            self.create_todo(
                &cat.id,
                deworm_reminder_kind(kind),
                format!(
                    "[{}提醒] {} 需要进行{}了，上次驱虫时间：{}",
                    deworm_label(kind),
                    cat.name,
                    deworm_label(kind),
                    last.deworm_date.format("%Y-%m-%d")
                ),
            )?;
        }

        Ok(())
    }

    /// Three independent countdown checks against the precomputed markers of
    /// the most recent undelivered pregnancy. Near delivery all three can
    /// fire in the same pass.
    fn check_pregnancy_reminders(&self, cat: &Cat, today: NaiveDate) -> Result<()> {
        let mut pregnancies = self.pregnancy_repository.list_pregnancies(&cat.id)?;
        pregnancies.sort_by(|a, b| {
            a.mating_date
                .cmp(&b.mating_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        let current: &PregnancyRecord = match pregnancies.last() {
            Some(pregnancy) => pregnancy,
            None => return Ok(()),
        };
        if current.is_delivered {
            return Ok(());
        }

        let thresholds = [
            (PregnancyThreshold::SevenDays, current.reminder_7_days, 7),
            (PregnancyThreshold::ThreeDays, current.reminder_3_days, 3),
            (PregnancyThreshold::OneDay, current.reminder_1_day, 1),
        ];

        for (threshold, marker, days) in thresholds {
            if today >= marker {
                self.create_todo(
                    &cat.id,
                    ReminderKind::Pregnancy(threshold),
                    format!(
                        "[预产提醒] {} 预计{}天后生产，预产期：{}",
                        cat.name,
                        days,
                        current.expected_delivery_date.format("%Y-%m-%d")
                    ),
                )?;
            }
        }

        Ok(())
    }

    /// Insert a pending to-do unless one of the same kind is already pending
    /// for this cat. Completed items never suppress.
    fn create_todo(&self, cat_id: &str, kind: ReminderKind, content: String) -> Result<()> {
        let pending = self.todo_repository.list_pending_todos()?;
        let duplicate = pending
            .iter()
            .any(|todo| todo.cat_id == cat_id && todo.kind == kind);
        if duplicate {
            debug!(
                "Skipping duplicate pending to-do for {}: {}",
                cat_id,
                kind.to_string()
            );
            return Ok(());
        }

        let now = Utc::now();
        let todo = Todo {
            id: Todo::generate_id(now.timestamp_millis() as u64),
            cat_id: cat_id.to_string(),
            kind,
            content,
            status: TodoStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.todo_repository.store_todo(&todo)?;

        info!("Created to-do {}: {}", todo.id, todo.content);
        Ok(())
    }

    /// Deletion can race with a running pass, so re-check before writing a
    /// synthesized record against the cat.
    fn cat_still_exists(&self, cat_id: &str) -> Result<bool> {
        if self.cat_repository.get_cat(cat_id)?.is_none() {
            warn!("Cat {} no longer exists, skipping record synthesis", cat_id);
            return Ok(false);
        }
        Ok(true)
    }

    fn list_weight_records_sorted(&self, cat_id: &str) -> Result<Vec<WeightRecord>> {
        let mut records = self.weight_repository.list_weight_records(cat_id)?;
        records.sort_by(|a, b| {
            a.weigh_date
                .cmp(&b.weigh_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    fn list_vaccinations_sorted(&self, cat_id: &str) -> Result<Vec<VaccinationRecord>> {
        let mut records = self.vaccination_repository.list_vaccinations(cat_id)?;
        records.sort_by(|a, b| {
            a.injection_date
                .cmp(&b.injection_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    fn list_dewormings_sorted(
        &self,
        cat_id: &str,
        kind: DewormingKind,
    ) -> Result<Vec<DewormingRecord>> {
        let mut records = self.deworming_repository.list_dewormings(cat_id, kind)?;
        records.sort_by(|a, b| {
            a.deworm_date
                .cmp(&b.deworm_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }
}

fn deworm_reminder_kind(kind: DewormingKind) -> ReminderKind {
    match kind {
        DewormingKind::External => ReminderKind::ExternalDeworm,
        DewormingKind::Internal => ReminderKind::InternalDeworm,
    }
}

fn deworm_label(kind: DewormingKind) -> &'static str {
    match kind {
        DewormingKind::External => "体外驱虫",
        DewormingKind::Internal => "体内驱虫",
    }
}

fn initial_deworm_brand(kind: DewormingKind) -> &'static str {
    match kind {
        DewormingKind::External => INITIAL_EXTERNAL_DEWORM_BRAND,
        DewormingKind::Internal => INITIAL_INTERNAL_DEWORM_BRAND,
    }
}
