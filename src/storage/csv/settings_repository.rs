//! # Settings Repository
//!
//! File-based storage for the two user-configurable settings documents,
//! kept as YAML files at the root of the data directory:
//!
//! ```text
//! data/
//! ├── reminder_settings.yaml    ← reminder intervals (days)
//! ├── pregnancy_settings.yaml   ← gestation length + reminder switch
//! ├── cats.csv
//! └── ...
//! ```
//!
//! Both documents are created with their defaults on first read and are
//! re-read from disk by every reminder pass, so edits take effect without
//! restarting anything.

use anyhow::Result;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::domain::models::settings::{PregnancySettings, ReminderSettings};

const REMINDER_SETTINGS_FILE: &str = "reminder_settings.yaml";
const PREGNANCY_SETTINGS_FILE: &str = "pregnancy_settings.yaml";

/// Storage trait for the settings documents
pub trait SettingsStorage: Send + Sync {
    /// Get the reminder intervals, creating the default document if absent
    fn get_reminder_settings(&self) -> Result<ReminderSettings>;

    /// Replace the reminder intervals
    fn save_reminder_settings(&self, settings: &ReminderSettings) -> Result<()>;

    /// Get the pregnancy settings, creating the default document if absent
    fn get_pregnancy_settings(&self) -> Result<PregnancySettings>;

    /// Replace the pregnancy settings
    fn save_pregnancy_settings(&self, settings: &PregnancySettings) -> Result<()>;
}

/// YAML-backed settings repository
#[derive(Clone)]
pub struct SettingsRepository {
    connection: Arc<CsvConnection>,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    /// Load a settings document from file, creating the default if it
    /// doesn't exist yet
    fn load_or_create<T>(&self, file_name: &str) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let path = self.connection.collection_path(file_name);

        if path.exists() {
            let yaml_content = fs::read_to_string(&path)?;
            let settings: T = serde_yaml::from_str(&yaml_content)?;
            debug!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let settings = T::default();
            self.save(file_name, &settings)?;
            info!("Created default settings at {:?}", path);
            Ok(settings)
        }
    }

    /// Save a settings document to file
    fn save<T: Serialize>(&self, file_name: &str, settings: &T) -> Result<()> {
        let path = self.connection.collection_path(file_name);
        let yaml_content = serde_yaml::to_string(settings)?;

        // Use atomic write pattern: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &path)?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }
}

impl SettingsStorage for SettingsRepository {
    fn get_reminder_settings(&self) -> Result<ReminderSettings> {
        self.load_or_create(REMINDER_SETTINGS_FILE)
    }

    fn save_reminder_settings(&self, settings: &ReminderSettings) -> Result<()> {
        self.save(REMINDER_SETTINGS_FILE, settings)
    }

    fn get_pregnancy_settings(&self) -> Result<PregnancySettings> {
        self.load_or_create(PREGNANCY_SETTINGS_FILE)
    }

    fn save_pregnancy_settings(&self, settings: &PregnancySettings) -> Result<()> {
        self.save(PREGNANCY_SETTINGS_FILE, settings)
    }
}
