//! Royalty calculation for blasting operations.
//!
//! The royalty owed for a blast is derived from the explosives used
//! (water gel and ammonium nitrate) and the powder factor, using a set of
//! configurable coefficients held in a [`SettingsStore`]:
//!
//! ```
//! use mining_royalty::{RoyaltyCalculationInput, RoyaltyCalculator, SettingsStore};
//!
//! let store = SettingsStore::default();
//! let calculator = RoyaltyCalculator::new(store.get());
//! let result = calculator
//!     .calculate(&RoyaltyCalculationInput::new(100.0, 50.0, 0.4))
//!     .unwrap();
//! assert_eq!(result.calculations.blasted_rock_volume, 240.28);
//! ```

pub mod calculation;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod settings;
pub mod storage;
pub mod visualization;

#[cfg(feature = "web")]
pub mod web;

pub use calculation::{calculate_royalty, RoyaltyCalculator};
pub use config::AppConfig;
pub use error::RoyaltyError;
pub use io::{BlastLogReader, BlastLogRow, RecordWriter};
pub use models::{
    PercentageBound, RoyaltyCalculationInput, RoyaltyCalculationResult, RoyaltyRecord,
    RoyaltySettings, SettingsPatch,
};
pub use settings::{JsonFileSlot, SettingsStore};
pub use storage::RecordStore;
