use chrono::{DateTime, Utc};

use super::payment::{default_payment_due_date, DEFAULT_PAYMENT_TERMS_DAYS};
use super::royalty::calculate_royalty;
use crate::error::RoyaltyError;
use crate::models::{RoyaltyCalculationInput, RoyaltyCalculationResult, RoyaltySettings};

/// Calculator bound to one settings snapshot.
///
/// The snapshot is copied in at construction, so later settings updates never
/// affect a calculator already handed out.
#[derive(Debug, Clone)]
pub struct RoyaltyCalculator {
    settings: RoyaltySettings,
    payment_terms_days: i64,
}

impl RoyaltyCalculator {
    /// Create a calculator using the default 14-day payment terms.
    pub fn new(settings: RoyaltySettings) -> Self {
        Self {
            settings,
            payment_terms_days: DEFAULT_PAYMENT_TERMS_DAYS,
        }
    }

    pub fn with_payment_terms(mut self, days: i64) -> Self {
        self.payment_terms_days = days;
        self
    }

    pub fn settings(&self) -> &RoyaltySettings {
        &self.settings
    }

    pub fn payment_terms_days(&self) -> i64 {
        self.payment_terms_days
    }

    /// Calculate with the due date defaulted to now plus the payment terms.
    pub fn calculate(
        &self,
        input: &RoyaltyCalculationInput,
    ) -> Result<RoyaltyCalculationResult, RoyaltyError> {
        let due = default_payment_due_date(Utc::now(), self.payment_terms_days)?;
        self.calculate_due(input, due)
    }

    /// Calculate with a caller-chosen due date.
    pub fn calculate_due(
        &self,
        input: &RoyaltyCalculationInput,
        payment_due_date: DateTime<Utc>,
    ) -> Result<RoyaltyCalculationResult, RoyaltyError> {
        calculate_royalty(&self.settings, input, payment_due_date)
    }

    /// Calculate every input; the first invalid one fails the batch with its
    /// 1-based position.
    pub fn calculate_batch(
        &self,
        inputs: &[RoyaltyCalculationInput],
    ) -> Result<Vec<RoyaltyCalculationResult>, RoyaltyError> {
        let due = default_payment_due_date(Utc::now(), self.payment_terms_days)?;
        inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                self.calculate_due(input, due).map_err(|e| match e {
                    RoyaltyError::InvalidInput(msg) => {
                        RoyaltyError::InvalidInput(format!("Row {}: {msg}", i + 1))
                    }
                    other => other,
                })
            })
            .collect()
    }
}

impl Default for RoyaltyCalculator {
    fn default() -> Self {
        Self::new(RoyaltySettings::DEFAULT)
    }
}
