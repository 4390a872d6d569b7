//! User-configurable reminder settings. Both documents live as YAML files in
//! the data directory and are read fresh on every reminder pass, so edits
//! take effect without a restart.

use serde::{Deserialize, Serialize};

/// Intervals, in days, driving the recurring reminder rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// Days between weighings before a weight reminder fires.
    pub weight_reminder_interval: u32,
    /// Days a vaccination stays current.
    pub vaccine_reminder_interval: u32,
    /// Days an external deworming stays current.
    pub external_deworming_interval: u32,
    /// Days an internal deworming stays current.
    pub internal_deworming_interval: u32,
    /// How many days before the next birthday the age reminder fires.
    pub age_reminder_interval: u32,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            weight_reminder_interval: 30,
            vaccine_reminder_interval: 365,
            external_deworming_interval: 90,
            internal_deworming_interval: 90,
            age_reminder_interval: 30,
        }
    }
}

/// Gestation length and the master switch for pregnancy reminders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PregnancySettings {
    /// Gestation length in days; delivery schedules are derived from it.
    pub pregnancy_duration: u32,
    pub enable_reminders: bool,
}

impl Default for PregnancySettings {
    fn default() -> Self {
        Self {
            pregnancy_duration: 63,
            enable_reminders: true,
        }
    }
}
