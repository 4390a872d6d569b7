//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use crate::domain::models::cat::{Cat, CatPage, CatQueryFilters};
use crate::domain::models::finance::{Purchase, SaleRecord};
use crate::domain::models::health::{
    DewormingKind, DewormingRecord, IllnessRecord, VaccinationRecord, WeightRecord,
};
use crate::domain::models::pregnancy::PregnancyRecord;
use crate::domain::models::todo::Todo;

/// Trait defining the interface for cat storage operations
///
/// This trait abstracts away the specific storage implementation details,
/// allowing the domain layer to work with different storage backends
/// (SQL databases, CSV files, etc.) without modification.
///
/// Note: All operations are synchronous for desktop-only use
pub trait CatStorage: Send + Sync {
    /// Store a new cat
    fn store_cat(&self, cat: &Cat) -> Result<()>;

    /// Retrieve a specific cat by ID
    fn get_cat(&self, cat_id: &str) -> Result<Option<Cat>>;

    /// List all cats ordered by name
    fn list_cats(&self) -> Result<Vec<Cat>>;

    /// Fetch one page of cats matching the filters
    /// Pages are 1-based; rows are ordered by creation time then ID so that
    /// repeated pagination over an unchanged store never skips or repeats a cat
    fn get_cat_page(&self, page: u32, page_size: u32, filters: &CatQueryFilters) -> Result<CatPage>;

    /// Update an existing cat
    /// Fails if no cat with the same ID exists
    fn update_cat(&self, cat: &Cat) -> Result<()>;

    /// Delete a cat by ID
    fn delete_cat(&self, cat_id: &str) -> Result<()>;
}

/// Trait defining the interface for weight record storage operations
pub trait WeightStorage: Send + Sync {
    /// Store a new weight record
    fn store_weight_record(&self, record: &WeightRecord) -> Result<()>;

    /// List all weight records for a cat ordered by weigh date ascending
    fn list_weight_records(&self, cat_id: &str) -> Result<Vec<WeightRecord>>;

    /// Update an existing weight record
    /// Fails if no record with the same ID exists
    fn update_weight_record(&self, record: &WeightRecord) -> Result<()>;

    /// Delete a single weight record
    /// Returns true if the record was found and deleted, false otherwise
    fn delete_weight_record(&self, record_id: &str) -> Result<bool>;

    /// Delete all weight records for a cat
    /// Returns the number of records actually deleted
    fn delete_weight_records_for_cat(&self, cat_id: &str) -> Result<u32>;
}

/// Trait defining the interface for vaccination record storage operations
pub trait VaccinationStorage: Send + Sync {
    /// Store a new vaccination record
    fn store_vaccination(&self, record: &VaccinationRecord) -> Result<()>;

    /// List all vaccination records for a cat ordered by injection date ascending
    fn list_vaccinations(&self, cat_id: &str) -> Result<Vec<VaccinationRecord>>;

    /// Update an existing vaccination record
    /// Fails if no record with the same ID exists
    fn update_vaccination(&self, record: &VaccinationRecord) -> Result<()>;

    /// Delete a single vaccination record
    /// Returns true if the record was found and deleted, false otherwise
    fn delete_vaccination(&self, record_id: &str) -> Result<bool>;

    /// Delete all vaccination records for a cat
    /// Returns the number of records actually deleted
    fn delete_vaccinations_for_cat(&self, cat_id: &str) -> Result<u32>;
}

/// Trait defining the interface for deworming record storage operations
///
/// External and internal treatments live in separate collections; every
/// operation takes the kind explicitly so the two histories never mix.
pub trait DewormingStorage: Send + Sync {
    /// Store a new deworming record (routed by its kind)
    fn store_deworming(&self, record: &DewormingRecord) -> Result<()>;

    /// List all deworming records of one kind for a cat ordered by deworm date ascending
    fn list_dewormings(&self, cat_id: &str, kind: DewormingKind) -> Result<Vec<DewormingRecord>>;

    /// Update an existing deworming record within its kind's collection
    /// Fails if no record with the same ID exists
    fn update_deworming(&self, record: &DewormingRecord) -> Result<()>;

    /// Delete a single deworming record of the given kind
    /// Returns true if the record was found and deleted, false otherwise
    fn delete_deworming(&self, kind: DewormingKind, record_id: &str) -> Result<bool>;

    /// Delete all deworming records (both kinds) for a cat
    /// Returns the number of records actually deleted
    fn delete_dewormings_for_cat(&self, cat_id: &str) -> Result<u32>;
}

/// Trait defining the interface for illness record storage operations
pub trait IllnessStorage: Send + Sync {
    /// Store a new illness record
    fn store_illness(&self, record: &IllnessRecord) -> Result<()>;

    /// Retrieve a specific illness record by ID
    fn get_illness(&self, record_id: &str) -> Result<Option<IllnessRecord>>;

    /// List all illness records for a cat ordered by illness date ascending
    fn list_illnesses(&self, cat_id: &str) -> Result<Vec<IllnessRecord>>;

    /// Update an existing illness record
    /// Fails if no record with the same ID exists
    fn update_illness(&self, record: &IllnessRecord) -> Result<()>;

    /// Delete a single illness record
    /// Returns true if the record was found and deleted, false otherwise
    fn delete_illness(&self, record_id: &str) -> Result<bool>;

    /// Delete all illness records for a cat
    /// Returns the number of records actually deleted
    fn delete_illnesses_for_cat(&self, cat_id: &str) -> Result<u32>;
}

/// Trait defining the interface for pregnancy record storage operations
pub trait PregnancyStorage: Send + Sync {
    /// Store a new pregnancy record
    fn store_pregnancy(&self, record: &PregnancyRecord) -> Result<()>;

    /// Retrieve a specific pregnancy record by ID
    fn get_pregnancy(&self, record_id: &str) -> Result<Option<PregnancyRecord>>;

    /// List all pregnancy records for a cat ordered by mating date ascending
    fn list_pregnancies(&self, cat_id: &str) -> Result<Vec<PregnancyRecord>>;

    /// Update an existing pregnancy record
    /// Fails if no record with the same ID exists
    fn update_pregnancy(&self, record: &PregnancyRecord) -> Result<()>;

    /// Delete a single pregnancy record
    /// Returns true if the record was found and deleted, false otherwise
    fn delete_pregnancy(&self, record_id: &str) -> Result<bool>;

    /// Delete all pregnancy records for a cat
    /// Returns the number of records actually deleted
    fn delete_pregnancies_for_cat(&self, cat_id: &str) -> Result<u32>;
}

/// Trait defining the interface for to-do storage operations
pub trait TodoStorage: Send + Sync {
    /// Store a new to-do
    fn store_todo(&self, todo: &Todo) -> Result<()>;

    /// Retrieve a specific to-do by ID
    fn get_todo(&self, todo_id: &str) -> Result<Option<Todo>>;

    /// List all to-dos (any status) for a cat
    fn list_todos_for_cat(&self, cat_id: &str) -> Result<Vec<Todo>>;

    /// List all to-dos that are still pending
    fn list_pending_todos(&self) -> Result<Vec<Todo>>;

    /// Update an existing to-do
    /// Fails if no to-do with the same ID exists
    fn update_todo(&self, todo: &Todo) -> Result<()>;

    /// Delete a single to-do
    /// Returns true if the to-do was found and deleted, false otherwise
    fn delete_todo(&self, todo_id: &str) -> Result<bool>;

    /// Delete all to-dos (any status) for a cat
    /// Returns the number of to-dos actually deleted
    fn delete_todos_for_cat(&self, cat_id: &str) -> Result<u32>;
}

/// Trait defining the interface for purchase and sale storage operations
pub trait FinanceStorage: Send + Sync {
    /// Store a new purchase
    fn store_purchase(&self, purchase: &Purchase) -> Result<()>;

    /// List all purchases ordered by purchase date descending (most recent first)
    fn list_purchases(&self) -> Result<Vec<Purchase>>;

    /// Delete a single purchase
    /// Returns true if the purchase was found and deleted, false otherwise
    fn delete_purchase(&self, purchase_id: &str) -> Result<bool>;

    /// Store a new sale
    fn store_sale(&self, sale: &SaleRecord) -> Result<()>;

    /// List all sales ordered by sale date descending (most recent first)
    fn list_sales(&self) -> Result<Vec<SaleRecord>>;

    /// Delete a single sale
    /// Returns true if the sale was found and deleted, false otherwise
    fn delete_sale(&self, sale_id: &str) -> Result<bool>;
}
