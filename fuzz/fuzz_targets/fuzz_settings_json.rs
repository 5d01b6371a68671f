#![no_main]

use libfuzzer_sys::fuzz_target;
use mining_royalty::settings::{MemorySlot, SettingsSlot, SETTINGS_KEY};
use mining_royalty::{PercentageBound, RoyaltySettings, SettingsStore};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let mut slot = MemorySlot::new();
    if slot.store(SETTINGS_KEY, raw).is_err() {
        return;
    }
    let store = SettingsStore::new(slot, PercentageBound::NonNegative);
    let settings = store.get();
    // Whatever was stored, reads yield a usable snapshot.
    assert!(settings.validate(PercentageBound::NonNegative).is_ok());
    if serde_json::from_str::<RoyaltySettings>(raw).is_err() {
        assert_eq!(settings, RoyaltySettings::DEFAULT);
    }
});
