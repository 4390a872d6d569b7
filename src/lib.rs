//! # Cattery Tracker
//!
//! Record keeping and reminder engine for a small cattery: cat profiles,
//! health and breeding records, money movements, and the to-do items derived
//! from all of them.
//!
//! Everything persists as plain CSV and YAML files under one data directory,
//! so a cattery's records stay human-readable and easy to back up. The
//! [`Cattery`] struct wires the services together over that directory; hosts
//! (a desktop UI, a CLI) call the services directly and own concerns like
//! logger initialization themselves.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

pub mod domain;
pub mod storage;

pub use storage::csv::CsvConnection;

/// Main entry point orchestrating all services over one shared data
/// directory.
pub struct Cattery {
    pub cat_service: domain::CatService,
    pub record_service: domain::RecordService,
    pub todo_service: domain::TodoService,
    pub settings_service: domain::SettingsService,
    pub finance_service: domain::FinanceService,
}

impl Cattery {
    /// Open a cattery over the given data directory, creating it if needed
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let csv_conn = Arc::new(CsvConnection::new(data_dir)?);
        Ok(Self::with_connection(csv_conn))
    }

    /// Open a cattery in the platform default location
    /// (`Documents/Cattery Tracker`)
    pub fn new_default() -> Result<Self> {
        let csv_conn = Arc::new(CsvConnection::new_default()?);
        Ok(Self::with_connection(csv_conn))
    }

    fn with_connection(csv_conn: Arc<CsvConnection>) -> Self {
        let cat_service = domain::CatService::new(csv_conn.clone());
        let record_service = domain::RecordService::new(csv_conn.clone());
        let todo_service = domain::TodoService::new(csv_conn.clone(), cat_service.clone());
        let settings_service = domain::SettingsService::new(csv_conn.clone());
        let finance_service = domain::FinanceService::new(csv_conn);

        Cattery {
            cat_service,
            record_service,
            todo_service,
            settings_service,
            finance_service,
        }
    }
}
