//! # CSV Storage Module
//!
//! File-based storage implementation for the cattery tracker. Every record
//! collection lives in one flat CSV file inside a single data directory;
//! the two settings documents are YAML files next to them.
//!
//! ## File Layout
//!
//! ```text
//! data/
//! ├── cats.csv
//! ├── weight_records.csv
//! ├── vaccinations.csv
//! ├── external_dewormings.csv
//! ├── internal_dewormings.csv
//! ├── illnesses.csv
//! ├── pregnancies.csv
//! ├── todos.csv
//! ├── purchases.csv
//! ├── sales.csv
//! ├── reminder_settings.yaml
//! └── pregnancy_settings.yaml
//! ```
//!
//! ## Write Semantics
//!
//! Every mutation reads the whole collection, changes it in memory, and
//! rewrites the file atomically (temp file, then rename). There are no
//! cross-collection transactions; a multi-step operation that fails midway
//! leaves its earlier writes in place.

pub mod cat_repository;
pub mod connection;
pub mod deworming_repository;
pub mod finance_repository;
pub mod illness_repository;
pub mod pregnancy_repository;
pub mod settings_repository;
pub mod todo_repository;
pub mod vaccination_repository;
pub mod weight_repository;

#[cfg(test)]
pub mod test_utils;

pub use cat_repository::CatRepository;
pub use connection::CsvConnection;
pub use deworming_repository::DewormingRepository;
pub use finance_repository::FinanceRepository;
pub use illness_repository::IllnessRepository;
pub use pregnancy_repository::PregnancyRepository;
pub use settings_repository::{SettingsRepository, SettingsStorage};
pub use todo_repository::TodoRepository;
pub use vaccination_repository::VaccinationRepository;
pub use weight_repository::WeightRepository;
