//! # Storage Module
//!
//! Handles all data persistence for the cattery tracker.
//!
//! This module abstracts away the specific storage implementation details and
//! provides a consistent interface for persisting and retrieving data. The
//! implementation can be swapped out (SQLite, flat files, cloud storage, etc.)
//! without affecting the domain logic.
//!
//! ## Key Responsibilities
//!
//! - **Data Persistence**: Saving cats, health records and to-dos to disk
//! - **Data Retrieval**: Loading stored data back into memory
//! - **Storage Abstraction**: Providing a consistent API regardless of backend
//! - **Atomic Writes**: Rewriting collection files safely via temp file + rename
//!
//! ## Current Implementation
//!
//! - **Primary Storage**: CSV files, one per record collection, plus YAML for
//!   settings (human-readable, git-friendly)
//!
//! ## Design Principles
//!
//! - **Repository Pattern**: Clean separation between domain and data access
//! - **Interface Segregation**: Focused traits for specific data operations
//! - **Dependency Inversion**: Domain depends on storage abstractions, not implementations

pub mod csv;
pub mod traits;

// Re-export the main types that other modules need
pub use csv::CsvConnection;
pub use traits::{
    CatStorage, DewormingStorage, FinanceStorage, IllnessStorage, PregnancyStorage, TodoStorage,
    VaccinationStorage, WeightStorage,
};
