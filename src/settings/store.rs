use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use super::slot::{MemorySlot, SettingsSlot};
use crate::error::RoyaltyError;
use crate::models::{PercentageBound, RoyaltySettings, SettingsPatch};

/// Slot key under which settings are persisted.
pub const SETTINGS_KEY: &str = "royaltySettings";

/// Single source of truth for the royalty coefficients.
///
/// All access goes through one mutex, so a `get` racing an `update` or `reset`
/// sees either the whole old value or the whole new one.
pub struct SettingsStore {
    slot: Mutex<Box<dyn SettingsSlot>>,
    bound: PercentageBound,
}

impl SettingsStore {
    pub fn new(slot: impl SettingsSlot + 'static, bound: PercentageBound) -> Self {
        Self {
            slot: Mutex::new(Box::new(slot)),
            bound,
        }
    }

    /// Store backed by a process-local slot.
    pub fn in_memory(bound: PercentageBound) -> Self {
        Self::new(MemorySlot::new(), bound)
    }

    /// Lower bound applied to the percentage fields on update.
    pub fn bound(&self) -> PercentageBound {
        self.bound
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn SettingsSlot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current settings. Falls back to the defaults when nothing is stored, the
    /// stored value cannot be read or decoded, or it holds a coefficient that no
    /// configuration accepts. The percentage bound only gates writes.
    pub fn get(&self) -> RoyaltySettings {
        let slot = self.lock();
        self.read(&**slot)
    }

    fn read(&self, slot: &dyn SettingsSlot) -> RoyaltySettings {
        let raw = match slot.load(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return RoyaltySettings::DEFAULT,
            Err(e) => {
                warn!(error = %e, "failed to read royalty settings, using defaults");
                return RoyaltySettings::DEFAULT;
            }
        };
        match serde_json::from_str::<RoyaltySettings>(&raw) {
            Ok(settings) if settings.validate(PercentageBound::NonNegative).is_ok() => settings,
            Ok(_) => {
                warn!("stored royalty settings are out of range, using defaults");
                RoyaltySettings::DEFAULT
            }
            Err(e) => {
                warn!(error = %e, "stored royalty settings are corrupt, using defaults");
                RoyaltySettings::DEFAULT
            }
        }
    }

    fn write(
        slot: &mut dyn SettingsSlot,
        settings: &RoyaltySettings,
    ) -> Result<(), RoyaltyError> {
        let value = serde_json::to_string(settings)?;
        slot.store(SETTINGS_KEY, &value).map_err(|e| match e {
            RoyaltyError::SettingsPersistence(_) => e,
            other => RoyaltyError::SettingsPersistence(other.to_string()),
        })
    }

    /// Replace all settings. Nothing is persisted unless every field is valid.
    pub fn update(&self, settings: RoyaltySettings) -> Result<(), RoyaltyError> {
        settings.validate(self.bound)?;
        let mut slot = self.lock();
        Self::write(&mut **slot, &settings)?;
        info!(?settings, "royalty settings updated");
        Ok(())
    }

    /// Overlay `patch` on the current settings and store the result as a full
    /// replacement. Returns the settings now in force.
    pub fn apply_patch(&self, patch: &SettingsPatch) -> Result<RoyaltySettings, RoyaltyError> {
        let mut slot = self.lock();
        let merged = patch.apply(self.read(&**slot));
        merged.validate(self.bound)?;
        Self::write(&mut **slot, &merged)?;
        info!(settings = ?merged, "royalty settings patched");
        Ok(merged)
    }

    /// Restore the default snapshot.
    pub fn reset(&self) -> Result<(), RoyaltyError> {
        let mut slot = self.lock();
        Self::write(&mut **slot, &RoyaltySettings::DEFAULT)?;
        info!("royalty settings reset to defaults");
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::in_memory(PercentageBound::default())
    }
}
