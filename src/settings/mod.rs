mod slot;
mod store;

pub use slot::{JsonFileSlot, MemorySlot, SettingsSlot};
pub use store::{SettingsStore, SETTINGS_KEY};
