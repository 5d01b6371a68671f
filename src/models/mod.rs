mod calculation;
mod record;
mod settings;

pub use calculation::{
    CalculationInputs, Calculations, ChargeBreakdown, RatesApplied, RoyaltyCalculationInput,
    RoyaltyCalculationResult,
};
pub use record::RoyaltyRecord;
pub use settings::{PercentageBound, RoyaltySettings, SettingsIssue, SettingsPatch};
