//! Domain-level command and query types.
//! These structs are used by services inside the domain layer and are **not**
//! exposed over any public API surface. A UI layer is responsible for mapping
//! its own input types to these internal ones. Dates travel as `YYYY-MM-DD`
//! strings and are parsed (and rejected) by the services.

pub mod cats {
    use crate::domain::models::cat::Cat;

    /// Input for creating a new cat.
    #[derive(Debug, Clone)]
    pub struct CreateCatCommand {
        pub name: String,
        pub breed: String,
        pub color: String,
        pub birth_date: Option<String>,
        pub arrival_date: Option<String>,
        /// Age in full years; derived from the birth date when omitted.
        pub age: Option<i32>,
        pub father_id: Option<String>,
        pub mother_id: Option<String>,
        pub weight: f64,
    }

    /// Input for updating a cat. `None` fields are left unchanged.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateCatCommand {
        pub cat_id: String,
        pub name: Option<String>,
        pub breed: Option<String>,
        pub color: Option<String>,
        pub birth_date: Option<String>,
        pub arrival_date: Option<String>,
        pub age: Option<i32>,
        pub father_id: Option<String>,
        pub mother_id: Option<String>,
        pub weight: Option<f64>,
    }

    /// Input for fetching a single cat.
    #[derive(Debug, Clone)]
    pub struct GetCatCommand {
        pub cat_id: String,
    }

    /// Input for deleting a cat and everything attached to it.
    #[derive(Debug, Clone)]
    pub struct DeleteCatCommand {
        pub cat_id: String,
    }

    /// Query parameters for one page of cats.
    #[derive(Debug, Clone)]
    pub struct CatPageQuery {
        /// 1-based page number.
        pub page: u32,
        pub page_size: u32,
        pub name: Option<String>,
        pub breed: Option<String>,
    }

    /// Result of creating a cat.
    #[derive(Debug, Clone)]
    pub struct CreateCatResult {
        pub cat: Cat,
    }

    /// Result of updating a cat.
    #[derive(Debug, Clone)]
    pub struct UpdateCatResult {
        pub cat: Cat,
    }

    /// Result of fetching a single cat.
    #[derive(Debug, Clone)]
    pub struct GetCatResult {
        pub cat: Option<Cat>,
    }

    /// Result of listing all cats.
    #[derive(Debug, Clone)]
    pub struct ListCatsResult {
        pub cats: Vec<Cat>,
    }

    /// Result of a paged cat query.
    #[derive(Debug, Clone)]
    pub struct CatPageResult {
        pub cats: Vec<Cat>,
        pub total_count: u32,
    }

    /// Result of deleting a cat.
    #[derive(Debug, Clone)]
    pub struct DeleteCatResult {
        pub success_message: String,
    }
}

pub mod records {
    use crate::domain::models::health::{
        DewormingKind, DewormingRecord, IllnessRecord, VaccinationRecord, WeightRecord,
    };
    use crate::domain::models::pregnancy::PregnancyRecord;

    /// Input for recording a weighing.
    #[derive(Debug, Clone)]
    pub struct AddWeightCommand {
        pub cat_id: String,
        pub weight: f64,
        /// Defaults to today when omitted.
        pub weigh_date: Option<String>,
    }

    /// Input for recording a vaccine injection.
    #[derive(Debug, Clone)]
    pub struct AddVaccinationCommand {
        pub cat_id: String,
        pub brand: String,
        pub injection_date: Option<String>,
    }

    /// Input for recording a deworming treatment.
    #[derive(Debug, Clone)]
    pub struct AddDewormingCommand {
        pub cat_id: String,
        pub kind: DewormingKind,
        pub brand: String,
        pub deworm_date: Option<String>,
    }

    /// Input for recording an illness.
    #[derive(Debug, Clone)]
    pub struct AddIllnessCommand {
        pub cat_id: String,
        pub illness_name: String,
        pub illness_date: Option<String>,
    }

    /// Input for marking an illness as cured.
    #[derive(Debug, Clone)]
    pub struct MarkIllnessCuredCommand {
        pub illness_id: String,
    }

    /// Input for recording a pregnancy; the delivery schedule is derived
    /// from the mating date and the configured gestation length.
    #[derive(Debug, Clone)]
    pub struct AddPregnancyCommand {
        pub cat_id: String,
        pub male_cat_id: Option<String>,
        pub mating_date: String,
        pub notes: Option<String>,
    }

    /// Input for recording a delivery on an open pregnancy.
    #[derive(Debug, Clone)]
    pub struct RecordDeliveryCommand {
        pub pregnancy_id: String,
        pub delivery_count: u32,
    }

    /// Result of recording a weighing.
    #[derive(Debug, Clone)]
    pub struct AddWeightResult {
        pub record: WeightRecord,
    }

    /// Result of recording a vaccine injection.
    #[derive(Debug, Clone)]
    pub struct AddVaccinationResult {
        pub record: VaccinationRecord,
    }

    /// Result of recording a deworming treatment.
    #[derive(Debug, Clone)]
    pub struct AddDewormingResult {
        pub record: DewormingRecord,
    }

    /// Result of recording an illness.
    #[derive(Debug, Clone)]
    pub struct AddIllnessResult {
        pub record: IllnessRecord,
    }

    /// Result of marking an illness as cured.
    #[derive(Debug, Clone)]
    pub struct MarkIllnessCuredResult {
        pub record: IllnessRecord,
    }

    /// Result of recording a pregnancy.
    #[derive(Debug, Clone)]
    pub struct AddPregnancyResult {
        pub record: PregnancyRecord,
    }

    /// Result of recording a delivery.
    #[derive(Debug, Clone)]
    pub struct RecordDeliveryResult {
        pub record: PregnancyRecord,
    }
}

pub mod todos {
    use crate::domain::models::todo::Todo;

    /// Input for completing a to-do.
    #[derive(Debug, Clone)]
    pub struct CompleteTodoCommand {
        pub todo_id: String,
    }

    /// Result of fetching pending to-dos (after a full reminder pass).
    #[derive(Debug, Clone)]
    pub struct GetPendingTodosResult {
        pub todos: Vec<Todo>,
    }

    /// Result of completing a to-do.
    #[derive(Debug, Clone)]
    pub struct CompleteTodoResult {
        pub todo: Todo,
    }
}

pub mod settings {
    use crate::domain::models::settings::{PregnancySettings, ReminderSettings};

    /// Input for replacing the reminder intervals.
    #[derive(Debug, Clone)]
    pub struct UpdateReminderSettingsCommand {
        pub weight_reminder_interval: u32,
        pub vaccine_reminder_interval: u32,
        pub external_deworming_interval: u32,
        pub internal_deworming_interval: u32,
        pub age_reminder_interval: u32,
    }

    /// Input for replacing the pregnancy settings.
    #[derive(Debug, Clone)]
    pub struct UpdatePregnancySettingsCommand {
        pub pregnancy_duration: u32,
        pub enable_reminders: bool,
    }

    /// Result of reading the reminder intervals.
    #[derive(Debug, Clone)]
    pub struct GetReminderSettingsResult {
        pub settings: ReminderSettings,
    }

    /// Result of replacing the reminder intervals.
    #[derive(Debug, Clone)]
    pub struct UpdateReminderSettingsResult {
        pub settings: ReminderSettings,
        pub success_message: String,
    }

    /// Result of reading the pregnancy settings.
    #[derive(Debug, Clone)]
    pub struct GetPregnancySettingsResult {
        pub settings: PregnancySettings,
    }

    /// Result of replacing the pregnancy settings.
    #[derive(Debug, Clone)]
    pub struct UpdatePregnancySettingsResult {
        pub settings: PregnancySettings,
        pub success_message: String,
    }
}

pub mod finance {
    use crate::domain::models::finance::{Purchase, SaleKind, SaleRecord};

    /// Input for recording an expense. `cat_id = Some` books the full amount
    /// against that cat; `None` splits it across every cat in the cattery.
    #[derive(Debug, Clone)]
    pub struct RecordPurchaseCommand {
        pub item: String,
        pub amount: f64,
        pub cat_id: Option<String>,
        pub purchase_date: Option<String>,
    }

    /// Input for recording a sale. Kitten sales must reference the sold
    /// kitten so the proceeds can be credited to its parents.
    #[derive(Debug, Clone)]
    pub struct RecordSaleCommand {
        pub kind: SaleKind,
        pub item: String,
        pub amount: f64,
        pub kitten_id: Option<String>,
        pub sale_date: Option<String>,
    }

    /// Result of recording an expense.
    #[derive(Debug, Clone)]
    pub struct RecordPurchaseResult {
        pub purchase: Purchase,
    }

    /// Result of recording a sale.
    #[derive(Debug, Clone)]
    pub struct RecordSaleResult {
        pub sale: SaleRecord,
    }

    /// Result of listing purchases.
    #[derive(Debug, Clone)]
    pub struct ListPurchasesResult {
        pub purchases: Vec<Purchase>,
    }

    /// Result of listing sales.
    #[derive(Debug, Clone)]
    pub struct ListSalesResult {
        pub sales: Vec<SaleRecord>,
    }
}
