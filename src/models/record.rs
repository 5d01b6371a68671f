use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RoyaltyCalculationResult;
use crate::error::RoyaltyError;

/// A saved royalty calculation attributed to a miner.
///
/// Flat shape handed to storage: the three measurements, the six calculated
/// quantities and both dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoyaltyRecord {
    pub id: Uuid,
    pub miner_id: String,
    pub water_gel: f64,
    pub nh4no3: f64,
    pub powder_factor: f64,
    pub total_explosive_quantity: f64,
    pub basic_volume: f64,
    pub blasted_rock_volume: f64,
    pub base_royalty: f64,
    pub royalty_with_sscl: f64,
    pub total_amount: f64,
    pub calculation_date: DateTime<Utc>,
    pub payment_due_date: DateTime<Utc>,
}

impl RoyaltyRecord {
    /// Flatten a calculation result into a record for `miner_id`.
    pub fn from_result(
        miner_id: &str,
        result: &RoyaltyCalculationResult,
    ) -> Result<Self, RoyaltyError> {
        let miner_id = miner_id.trim();
        if miner_id.is_empty() {
            return Err(RoyaltyError::InvalidInput("Miner ID is required".to_string()));
        }
        let c = &result.calculations;
        Ok(Self {
            id: Uuid::new_v4(),
            miner_id: miner_id.to_string(),
            water_gel: result.inputs.water_gel_kg,
            nh4no3: result.inputs.nh4no3_kg,
            powder_factor: result.inputs.powder_factor,
            total_explosive_quantity: c.total_explosive_quantity,
            basic_volume: c.basic_volume,
            blasted_rock_volume: c.blasted_rock_volume,
            base_royalty: c.base_royalty,
            royalty_with_sscl: c.royalty_with_sscl,
            total_amount: c.total_amount_with_vat,
            calculation_date: result.calculation_date,
            payment_due_date: result.payment_due_date,
        })
    }

    /// Whether `other` records the same blast for the same miner.
    pub fn is_duplicate_of(&self, other: &RoyaltyRecord) -> bool {
        self.miner_id == other.miner_id
            && self.water_gel == other.water_gel
            && self.nh4no3 == other.nh4no3
            && self.powder_factor == other.powder_factor
            && self.total_amount == other.total_amount
    }

    /// Whether the payment is overdue at `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.payment_due_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalculationInputs, Calculations, RatesApplied};
    use chrono::{Duration, TimeZone};

    fn sample_result() -> RoyaltyCalculationResult {
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        RoyaltyCalculationResult {
            calculation_date: date,
            payment_due_date: date + Duration::days(14),
            inputs: CalculationInputs {
                water_gel_kg: 80.0,
                nh4no3_kg: 20.0,
                powder_factor: 0.5,
            },
            calculations: Calculations {
                total_explosive_quantity: 116.0,
                basic_volume: 232.0,
                blasted_rock_volume: 131.17,
                base_royalty: 31480.8,
                royalty_with_sscl: 32286.71,
                total_amount_with_vat: 38098.32,
            },
            rates_applied: RatesApplied {
                royalty_rate_per_cubic_meter: 240.0,
                sscl_rate: "2.56%".to_string(),
                vat_rate: "18%".to_string(),
            },
            warning_message: None,
        }
    }

    #[test]
    fn test_from_result_flattens_fields() {
        let result = sample_result();
        let record = RoyaltyRecord::from_result("miner-7", &result).unwrap();
        assert_eq!(record.miner_id, "miner-7");
        assert_eq!(record.water_gel, 80.0);
        assert_eq!(record.nh4no3, 20.0);
        assert_eq!(record.powder_factor, 0.5);
        assert_eq!(record.basic_volume, 232.0);
        assert_eq!(record.blasted_rock_volume, 131.17);
        assert_eq!(record.total_amount, 38098.32);
        assert_eq!(record.calculation_date, result.calculation_date);
        assert_eq!(record.payment_due_date, result.payment_due_date);
    }

    #[test]
    fn test_from_result_requires_miner_id() {
        let err = RoyaltyRecord::from_result("   ", &sample_result()).unwrap_err();
        assert!(matches!(err, RoyaltyError::InvalidInput(_)));
        assert!(err.to_string().contains("Miner ID is required"));
    }

    #[test]
    fn test_from_result_trims_miner_id() {
        let record = RoyaltyRecord::from_result("  m-1 ", &sample_result()).unwrap();
        assert_eq!(record.miner_id, "m-1");
    }

    #[test]
    fn test_each_record_gets_fresh_id() {
        let a = RoyaltyRecord::from_result("m", &sample_result()).unwrap();
        let b = RoyaltyRecord::from_result("m", &sample_result()).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.is_duplicate_of(&b));
    }

    #[test]
    fn test_duplicate_differs_by_miner() {
        let a = RoyaltyRecord::from_result("m-1", &sample_result()).unwrap();
        let b = RoyaltyRecord::from_result("m-2", &sample_result()).unwrap();
        assert!(!a.is_duplicate_of(&b));
    }

    #[test]
    fn test_is_overdue() {
        let record = RoyaltyRecord::from_result("m", &sample_result()).unwrap();
        assert!(!record.is_overdue(record.calculation_date));
        assert!(record.is_overdue(record.payment_due_date + Duration::seconds(1)));
    }
}
