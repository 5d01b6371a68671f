use crate::calculation::{RoyaltyCalculator, DEFAULT_PAYMENT_TERMS_DAYS};
use crate::config::AppConfig;
use crate::error::RoyaltyError;
use crate::models::PercentageBound;
use crate::settings::{JsonFileSlot, SettingsStore};
use crate::storage::RecordStore;

/// Shared state handed to every request handler.
pub struct AppState {
    pub settings: SettingsStore,
    pub records: RecordStore,
    pub payment_terms_days: i64,
}

impl AppState {
    pub fn new(settings: SettingsStore, records: RecordStore, payment_terms_days: i64) -> Self {
        Self {
            settings,
            records,
            payment_terms_days,
        }
    }

    /// Open the settings file and record database named in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, RoyaltyError> {
        let settings = SettingsStore::new(
            JsonFileSlot::new(&config.storage.settings_path),
            config.calculation.percentage_bound(),
        );
        let records = RecordStore::open(&config.storage.database_path)?;
        Ok(Self::new(
            settings,
            records,
            config.calculation.payment_terms_days,
        ))
    }

    /// Process-local state with nothing on disk.
    pub fn new_in_memory() -> Result<Self, RoyaltyError> {
        Ok(Self::new(
            SettingsStore::in_memory(PercentageBound::default()),
            RecordStore::open_in_memory()?,
            DEFAULT_PAYMENT_TERMS_DAYS,
        ))
    }

    /// Calculator over the settings in force right now.
    pub fn calculator(&self) -> RoyaltyCalculator {
        RoyaltyCalculator::new(self.settings.get()).with_payment_terms(self.payment_terms_days)
    }
}
