//! # Domain Module
//!
//! Contains all business logic for the cattery tracker.
//!
//! This module encapsulates the core business rules, entities, and services
//! that define how cats, their health history and the money around them are
//! modeled and managed. It operates independently of any specific UI
//! framework or storage mechanism.
//!
//! ## Module Organization
//!
//! - **cat_service**: Cat profile CRUD and derived status recalculation
//! - **todo_service**: The reminder engine deriving pending to-do items
//! - **record_service**: Health and breeding record management
//! - **settings_service**: User-editable reminder and pregnancy settings
//! - **finance_service**: Purchases, sales and per-cat income/expense totals
//! - **commands**: Input and result types consumed by the services
//! - **models**: The domain entities themselves
//!
//! ## Key Responsibilities
//!
//! - **Status Derivation**: A cat's pregnant/sick/vaccinated/dewormed flags
//!   are caches over its records, recomputed here and nowhere else
//! - **Reminder Rules**: Seven independent rules turn record history plus
//!   configured intervals into pending to-dos, with per-kind deduplication
//! - **Record Validation**: Every record mutation checks its inputs and the
//!   referenced cat before anything is written
//! - **Money Apportioning**: Shared expenses split across the cattery,
//!   kitten-sale income splits between the parents
//!
//! ## Design Principles
//!
//! - **Single Responsibility**: Each service has a focused purpose
//! - **Storage Agnostic**: Services depend on storage traits, not files
//! - **Testability**: Synchronous, constructor-injected services exercised
//!   against temporary directories

pub mod cat_service;
pub mod commands;
pub mod finance_service;
pub mod models;
pub mod record_service;
pub mod settings_service;
pub mod todo_service;

pub use cat_service::CatService;
pub use finance_service::FinanceService;
pub use record_service::RecordService;
pub use settings_service::SettingsService;
pub use todo_service::TodoService;
