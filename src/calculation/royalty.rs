use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::RoyaltyError;
use crate::models::{
    CalculationInputs, Calculations, RatesApplied, RoyaltyCalculationInput,
    RoyaltyCalculationResult, RoyaltySettings,
};

/// Round to 2 decimal places, halves rounding up.
///
/// Inputs are never negative here, so `f64::round` (half away from zero) is
/// half-up.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render a percentage the way rates are displayed: `18` -> `"18%"`, `2.56` -> `"2.56%"`.
pub fn percentage_label(percentage: f64) -> String {
    format!("{percentage}%")
}

/// Warning attached when a zero powder factor is replaced by the default.
pub fn zero_powder_factor_warning(default_powder_factor: f64) -> String {
    format!(
        "Powder Factor cannot be zero. Using default value of {default_powder_factor} instead."
    )
}

/// Compute the royalty payable for one blast.
///
/// Steps, in order:
/// 1. `TEQ = water_gel * waterGelMultiplier + nh4no3`
/// 2. `basic_volume = TEQ / powder_factor`
/// 3. `blasted_rock_volume = round2((TEQ * expansionFactor) / (powder_factor * powderFactorMultiplier))`
/// 4. `base_royalty = blasted_rock_volume * royaltyRatePerM3`
/// 5. `royalty_with_sscl = base_royalty * (1 + ssclPercentage / 100)`
/// 6. `total_amount_with_vat = royalty_with_sscl * (1 + vatPercentage / 100)`
///
/// The rounded volume from step 3 feeds steps 4-6. A powder factor of zero is
/// replaced by `settings.default_powder_factor` and a warning is attached.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use mining_royalty::calculation::calculate_royalty;
/// use mining_royalty::models::{RoyaltyCalculationInput, RoyaltySettings};
///
/// let input = RoyaltyCalculationInput::new(100.0, 50.0, 0.4);
/// let result = calculate_royalty(&RoyaltySettings::DEFAULT, &input, Utc::now()).unwrap();
/// assert_eq!(result.calculations.blasted_rock_volume, 240.28);
/// assert!((result.calculations.base_royalty - 57667.2).abs() < 1e-6);
/// ```
pub fn calculate_royalty(
    settings: &RoyaltySettings,
    input: &RoyaltyCalculationInput,
    payment_due_date: DateTime<Utc>,
) -> Result<RoyaltyCalculationResult, RoyaltyError> {
    input.validate()?;

    let (powder_factor, warning_message) = if input.powder_factor == 0.0 {
        let message = zero_powder_factor_warning(settings.default_powder_factor);
        warn!(
            default_powder_factor = settings.default_powder_factor,
            "zero powder factor substituted"
        );
        (settings.default_powder_factor, Some(message))
    } else {
        (input.powder_factor, None)
    };

    let total_explosive_quantity = input.water_gel * settings.water_gel_multiplier + input.nh4no3;
    let basic_volume = total_explosive_quantity / powder_factor;
    let blasted_rock_volume = round_to_cents(
        (total_explosive_quantity * settings.expansion_factor)
            / (powder_factor * settings.powder_factor_multiplier),
    );
    let base_royalty = blasted_rock_volume * settings.royalty_rate_per_m3;
    let royalty_with_sscl = base_royalty * (1.0 + settings.sscl_percentage / 100.0);
    let total_amount_with_vat = royalty_with_sscl * (1.0 + settings.vat_percentage / 100.0);

    for (name, value) in [
        ("total_explosive_quantity", total_explosive_quantity),
        ("basic_volume", basic_volume),
        ("blasted_rock_volume", blasted_rock_volume),
        ("base_royalty", base_royalty),
        ("royalty_with_sscl", royalty_with_sscl),
        ("total_amount_with_vat", total_amount_with_vat),
    ] {
        if !value.is_finite() {
            return Err(RoyaltyError::InvalidInput(format!(
                "{name} is out of range for the given measurements"
            )));
        }
    }

    debug!(
        total_explosive_quantity,
        blasted_rock_volume, total_amount_with_vat, "royalty calculated"
    );

    Ok(RoyaltyCalculationResult {
        calculation_date: Utc::now(),
        payment_due_date,
        inputs: CalculationInputs {
            water_gel_kg: input.water_gel,
            nh4no3_kg: input.nh4no3,
            powder_factor,
        },
        calculations: Calculations {
            total_explosive_quantity,
            basic_volume,
            blasted_rock_volume,
            base_royalty,
            royalty_with_sscl,
            total_amount_with_vat,
        },
        rates_applied: RatesApplied {
            royalty_rate_per_cubic_meter: settings.royalty_rate_per_m3,
            sscl_rate: percentage_label(settings.sscl_percentage),
            vat_rate: percentage_label(settings.vat_percentage),
        },
        warning_message,
    })
}
