use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RoyaltyError;

/// Raw blasting measurements supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoyaltyCalculationInput {
    /// Water-gel explosive used, in kg
    pub water_gel: f64,
    /// Ammonium nitrate (NH4NO3) used, in kg
    pub nh4no3: f64,
    /// Powder factor; `0` means "unspecified" and is replaced by the default
    pub powder_factor: f64,
}

impl RoyaltyCalculationInput {
    pub fn new(water_gel: f64, nh4no3: f64, powder_factor: f64) -> Self {
        Self {
            water_gel,
            nh4no3,
            powder_factor,
        }
    }

    /// Reject non-finite or negative measurements with `RoyaltyError::InvalidInput`.
    pub fn validate(&self) -> Result<(), RoyaltyError> {
        for (name, value) in [
            ("water_gel", self.water_gel),
            ("nh4no3", self.nh4no3),
            ("powder_factor", self.powder_factor),
        ] {
            if !value.is_finite() {
                return Err(RoyaltyError::InvalidInput(format!(
                    "{name} must be a valid number, got {value}"
                )));
            }
            if value < 0.0 {
                return Err(RoyaltyError::InvalidInput(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// The measurements actually used, after any powder-factor substitution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationInputs {
    pub water_gel_kg: f64,
    pub nh4no3_kg: f64,
    pub powder_factor: f64,
}

/// Every intermediate and final quantity of the royalty formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calculations {
    pub total_explosive_quantity: f64,
    /// Diagnostic only; not used by later steps
    pub basic_volume: f64,
    /// Rounded to 2 decimal places
    pub blasted_rock_volume: f64,
    pub base_royalty: f64,
    pub royalty_with_sscl: f64,
    pub total_amount_with_vat: f64,
}

/// Rates in force when the calculation ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesApplied {
    pub royalty_rate_per_cubic_meter: f64,
    /// e.g. `"2.56%"`
    pub sscl_rate: String,
    /// e.g. `"18%"`
    pub vat_rate: String,
}

/// Result of a single royalty calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoyaltyCalculationResult {
    pub calculation_date: DateTime<Utc>,
    pub payment_due_date: DateTime<Utc>,
    pub inputs: CalculationInputs,
    pub calculations: Calculations,
    pub rates_applied: RatesApplied,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
}

/// How the payable total splits into royalty, surcharge and tax.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub base_royalty: f64,
    pub sscl_amount: f64,
    pub vat_amount: f64,
    pub total: f64,
}

impl RoyaltyCalculationResult {
    pub fn has_warning(&self) -> bool {
        self.warning_message.is_some()
    }

    pub fn charge_breakdown(&self) -> ChargeBreakdown {
        let c = &self.calculations;
        ChargeBreakdown {
            base_royalty: c.base_royalty,
            sscl_amount: c.royalty_with_sscl - c.base_royalty,
            vat_amount: c.total_amount_with_vat - c.royalty_with_sscl,
            total: c.total_amount_with_vat,
        }
    }
}
