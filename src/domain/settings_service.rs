use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;

use crate::domain::commands::settings::{
    GetPregnancySettingsResult, GetReminderSettingsResult, UpdatePregnancySettingsCommand,
    UpdatePregnancySettingsResult, UpdateReminderSettingsCommand, UpdateReminderSettingsResult,
};
use crate::domain::models::settings::{PregnancySettings, ReminderSettings};
use crate::storage::csv::{CsvConnection, SettingsRepository, SettingsStorage};

/// Service for the two user-editable settings documents. Reads go straight
/// to disk, so a change made here is picked up by the very next reminder
/// pass.
#[derive(Clone)]
pub struct SettingsService {
    settings_repository: SettingsRepository,
}

impl SettingsService {
    /// Create a new SettingsService
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        Self {
            settings_repository: SettingsRepository::new(csv_conn),
        }
    }

    /// Get the reminder intervals, defaulted when never saved
    pub fn get_reminder_settings(&self) -> Result<GetReminderSettingsResult> {
        let settings = self.settings_repository.get_reminder_settings()?;
        debug!("Loaded reminder settings: {:?}", settings);
        Ok(GetReminderSettingsResult { settings })
    }

    /// Replace the reminder intervals. Every interval must be at least one
    /// day.
    pub fn update_reminder_settings(
        &self,
        command: UpdateReminderSettingsCommand,
    ) -> Result<UpdateReminderSettingsResult> {
        let intervals = [
            ("weight_reminder_interval", command.weight_reminder_interval),
            (
                "vaccine_reminder_interval",
                command.vaccine_reminder_interval,
            ),
            (
                "external_deworming_interval",
                command.external_deworming_interval,
            ),
            (
                "internal_deworming_interval",
                command.internal_deworming_interval,
            ),
            ("age_reminder_interval", command.age_reminder_interval),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(anyhow::anyhow!("{} must be at least 1 day", name));
            }
        }

        let settings = ReminderSettings {
            weight_reminder_interval: command.weight_reminder_interval,
            vaccine_reminder_interval: command.vaccine_reminder_interval,
            external_deworming_interval: command.external_deworming_interval,
            internal_deworming_interval: command.internal_deworming_interval,
            age_reminder_interval: command.age_reminder_interval,
        };
        self.settings_repository.save_reminder_settings(&settings)?;

        info!("Updated reminder settings: {:?}", settings);
        Ok(UpdateReminderSettingsResult {
            settings,
            success_message: "Reminder settings updated successfully".to_string(),
        })
    }

    /// Get the pregnancy settings, defaulted when never saved
    pub fn get_pregnancy_settings(&self) -> Result<GetPregnancySettingsResult> {
        let settings = self.settings_repository.get_pregnancy_settings()?;
        debug!("Loaded pregnancy settings: {:?}", settings);
        Ok(GetPregnancySettingsResult { settings })
    }

    /// Replace the pregnancy settings. The gestation length must be at least
    /// one day. Existing pregnancy schedules keep the markers they were
    /// created with.
    pub fn update_pregnancy_settings(
        &self,
        command: UpdatePregnancySettingsCommand,
    ) -> Result<UpdatePregnancySettingsResult> {
        if command.pregnancy_duration == 0 {
            return Err(anyhow::anyhow!("pregnancy_duration must be at least 1 day"));
        }

        let settings = PregnancySettings {
            pregnancy_duration: command.pregnancy_duration,
            enable_reminders: command.enable_reminders,
        };
        self.settings_repository.save_pregnancy_settings(&settings)?;

        info!("Updated pregnancy settings: {:?}", settings);
        Ok(UpdatePregnancySettingsResult {
            settings,
            success_message: "Pregnancy settings updated successfully".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    fn setup_test() -> (SettingsService, TestEnvironment) {
        let env = TestEnvironment::new().unwrap();
        let service = SettingsService::new(Arc::new(env.connection.clone()));
        (service, env)
    }

    #[test]
    fn test_defaults_when_never_saved() {
        let (service, _env) = setup_test();

        let reminders = service.get_reminder_settings().unwrap().settings;
        assert_eq!(reminders, ReminderSettings::default());

        let pregnancy = service.get_pregnancy_settings().unwrap().settings;
        assert_eq!(pregnancy, PregnancySettings::default());
    }

    #[test]
    fn test_update_reminder_settings_persists() {
        let (service, _env) = setup_test();

        let result = service
            .update_reminder_settings(UpdateReminderSettingsCommand {
                weight_reminder_interval: 14,
                vaccine_reminder_interval: 180,
                external_deworming_interval: 45,
                internal_deworming_interval: 60,
                age_reminder_interval: 7,
            })
            .unwrap();
        assert_eq!(result.settings.weight_reminder_interval, 14);

        let loaded = service.get_reminder_settings().unwrap().settings;
        assert_eq!(loaded, result.settings);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let (service, _env) = setup_test();

        let result = service.update_reminder_settings(UpdateReminderSettingsCommand {
            weight_reminder_interval: 0,
            vaccine_reminder_interval: 365,
            external_deworming_interval: 90,
            internal_deworming_interval: 90,
            age_reminder_interval: 30,
        });
        assert!(result.is_err());

        // Nothing was written
        let loaded = service.get_reminder_settings().unwrap().settings;
        assert_eq!(loaded, ReminderSettings::default());
    }

    #[test]
    fn test_update_pregnancy_settings_persists() {
        let (service, _env) = setup_test();

        let result = service
            .update_pregnancy_settings(UpdatePregnancySettingsCommand {
                pregnancy_duration: 65,
                enable_reminders: false,
            })
            .unwrap();
        assert_eq!(result.settings.pregnancy_duration, 65);
        assert!(!result.settings.enable_reminders);

        let loaded = service.get_pregnancy_settings().unwrap().settings;
        assert_eq!(loaded, result.settings);
    }

    #[test]
    fn test_zero_gestation_is_rejected() {
        let (service, _env) = setup_test();

        let result = service.update_pregnancy_settings(UpdatePregnancySettingsCommand {
            pregnancy_duration: 0,
            enable_reminders: true,
        });
        assert!(result.is_err());
    }
}
