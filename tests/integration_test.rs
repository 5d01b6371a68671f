use assert_approx_eq::assert_approx_eq;
use chrono::{TimeZone, Utc};

use mining_royalty::{
    calculation::{default_payment_due_date, parse_due_date},
    error::RoyaltyError,
    io::{self, RecordWriter},
    models::{PercentageBound, SettingsPatch},
    JsonFileSlot, RecordStore, RoyaltyCalculationInput, RoyaltyCalculator, RoyaltyRecord,
    RoyaltySettings, SettingsStore,
};

fn reference_input() -> RoyaltyCalculationInput {
    RoyaltyCalculationInput::new(100.0, 50.0, 0.4)
}

#[test]
fn test_full_workflow_with_default_settings() {
    let store = SettingsStore::default();
    let calculator = RoyaltyCalculator::new(store.get());
    let due = parse_due_date("2024-06-30").unwrap();
    let result = calculator.calculate_due(&reference_input(), due).unwrap();

    let c = &result.calculations;
    assert_approx_eq!(c.total_explosive_quantity, 170.0);
    assert_approx_eq!(c.basic_volume, 425.0);
    assert_eq!(c.blasted_rock_volume, 240.28);
    assert_approx_eq!(c.base_royalty, 57667.2, 1e-6);
    assert_approx_eq!(c.royalty_with_sscl, 59143.48032, 1e-6);
    assert_approx_eq!(c.total_amount_with_vat, 69789.3067776, 1e-6);
    assert_eq!(result.rates_applied.sscl_rate, "2.56%");
    assert_eq!(result.rates_applied.vat_rate, "18%");
    assert_eq!(result.payment_due_date, due);

    let breakdown = result.charge_breakdown();
    assert_approx_eq!(
        breakdown.base_royalty + breakdown.sscl_amount + breakdown.vat_amount,
        breakdown.total,
        1e-6
    );
}

#[test]
fn test_settings_update_affects_only_new_calculators() {
    let store = SettingsStore::default();
    let before = RoyaltyCalculator::new(store.get());

    store
        .update(RoyaltySettings {
            royalty_rate_per_m3: 300.0,
            ..RoyaltySettings::DEFAULT
        })
        .unwrap();
    let after = RoyaltyCalculator::new(store.get());

    let old = before.calculate(&reference_input()).unwrap();
    let new = after.calculate(&reference_input()).unwrap();
    assert_eq!(old.rates_applied.royalty_rate_per_cubic_meter, 240.0);
    assert_eq!(new.rates_applied.royalty_rate_per_cubic_meter, 300.0);
    assert_approx_eq!(new.calculations.base_royalty, 240.28 * 300.0, 1e-6);
}

#[test]
fn test_persisted_settings_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let store = SettingsStore::new(JsonFileSlot::new(&path), PercentageBound::NonNegative);
    let patch = SettingsPatch {
        vat_percentage: Some(0.0),
        ..SettingsPatch::default()
    };
    store.apply_patch(&patch).unwrap();

    let reopened = SettingsStore::new(JsonFileSlot::new(&path), PercentageBound::NonNegative);
    let settings = reopened.get();
    assert_eq!(settings.vat_percentage, 0.0);

    let result = RoyaltyCalculator::new(settings)
        .calculate(&reference_input())
        .unwrap();
    assert_eq!(result.rates_applied.vat_rate, "0%");
    assert_approx_eq!(
        result.calculations.total_amount_with_vat,
        result.calculations.royalty_with_sscl
    );
}

#[test]
fn test_corrupt_settings_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "this is not json").unwrap();

    let store = SettingsStore::new(JsonFileSlot::new(&path), PercentageBound::NonNegative);
    assert_eq!(store.get(), RoyaltySettings::DEFAULT);

    store.update(RoyaltySettings::DEFAULT).unwrap();
    assert_eq!(store.get(), RoyaltySettings::DEFAULT);
}

#[test]
fn test_zero_powder_factor_substitution() {
    let result = RoyaltyCalculator::default()
        .calculate(&RoyaltyCalculationInput::new(100.0, 50.0, 0.0))
        .unwrap();
    assert_eq!(result.inputs.powder_factor, 0.5);
    assert!(result.has_warning());
    // (170 * 1.6) / (0.5 * 2.83) = 192.226... -> 192.23
    assert_eq!(result.calculations.blasted_rock_volume, 192.23);
}

#[test]
fn test_batch_from_blast_log_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("blasts.json");
    std::fs::write(
        &log,
        r#"[
            {"label": "A", "water_gel": 100, "nh4no3": 50, "powder_factor": 0.4},
            {"label": "B", "water_gel": 40, "nh4no3": 10, "powder_factor": 0.5}
        ]"#,
    )
    .unwrap();

    let rows = io::read_blast_log(&log).unwrap();
    let inputs: Vec<_> = rows.iter().map(|r| r.input()).collect();
    let results = RoyaltyCalculator::default().calculate_batch(&inputs).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].payment_due_date, results[1].payment_due_date);

    let store = RecordStore::open(dir.path().join("royalties.db")).unwrap();
    for result in &results {
        store
            .insert(&RoyaltyRecord::from_result("ML-100", result).unwrap())
            .unwrap();
    }
    let saved = store.list(Some("ML-100")).unwrap();
    assert_eq!(saved.len(), 2);

    let duplicate = RoyaltyRecord::from_result("ML-100", &results[0]).unwrap();
    assert!(matches!(
        store.insert(&duplicate),
        Err(RoyaltyError::Duplicate(_))
    ));
}

#[test]
fn test_export_all_formats() {
    let dir = tempfile::tempdir().unwrap();
    let result = RoyaltyCalculator::default()
        .calculate(&reference_input())
        .unwrap();
    let records = vec![RoyaltyRecord::from_result("ML-9", &result).unwrap()];

    let csv_path = dir.path().join("records.csv");
    io::CsvFormat.write(&records, &csv_path).unwrap();
    let csv_text = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv_text.contains("ML-9"));

    let json_path = dir.path().join("records.json");
    io::JsonFormat { pretty: false }
        .write(&records, &json_path)
        .unwrap();
    let loaded: Vec<RoyaltyRecord> =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(loaded, records);

    let xlsx_path = dir.path().join("records.xlsx");
    io::ExcelFormat.write(&records, &xlsx_path).unwrap();
    assert!(xlsx_path.exists());
}

#[test]
fn test_invalid_inputs_rejected() {
    let calculator = RoyaltyCalculator::default();
    for input in [
        RoyaltyCalculationInput::new(-1.0, 0.0, 0.4),
        RoyaltyCalculationInput::new(1.0, f64::NAN, 0.4),
        RoyaltyCalculationInput::new(1.0, 1.0, f64::INFINITY),
    ] {
        assert!(matches!(
            calculator.calculate(&input),
            Err(RoyaltyError::InvalidInput(_))
        ));
    }
}

#[test]
fn test_default_due_date_is_fourteen_days_out() {
    let from = Utc.with_ymd_and_hms(2024, 2, 20, 12, 0, 0).unwrap();
    let due = default_payment_due_date(from, 14).unwrap();
    assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap());
}
