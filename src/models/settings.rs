use serde::{Deserialize, Serialize};

use crate::error::RoyaltyError;

/// Coefficients that parameterize the royalty formula.
///
/// Serialized with the camelCase keys used by the persisted settings slot
/// (`waterGelMultiplier`, `royaltyRatePerM3`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoyaltySettings {
    /// Converts water-gel mass into explosive-equivalent mass
    pub water_gel_multiplier: f64,
    /// Rock expansion coefficient
    pub expansion_factor: f64,
    /// Scales the powder factor in the blasted-volume denominator
    pub powder_factor_multiplier: f64,
    /// Currency charged per cubic meter of blasted rock
    pub royalty_rate_per_m3: f64,
    /// SSCL surcharge, in percent
    pub sscl_percentage: f64,
    /// VAT, in percent
    pub vat_percentage: f64,
    /// Substituted when the caller supplies a powder factor of zero
    pub default_powder_factor: f64,
}

impl RoyaltySettings {
    /// The fixed default snapshot.
    pub const DEFAULT: RoyaltySettings = RoyaltySettings {
        water_gel_multiplier: 1.2,
        expansion_factor: 1.6,
        powder_factor_multiplier: 2.83,
        royalty_rate_per_m3: 240.0,
        sscl_percentage: 2.56,
        vat_percentage: 18.0,
        default_powder_factor: 0.5,
    };

    /// Field names (as persisted) paired with their values.
    pub fn fields(&self) -> [(&'static str, f64); 7] {
        [
            ("waterGelMultiplier", self.water_gel_multiplier),
            ("expansionFactor", self.expansion_factor),
            ("powderFactorMultiplier", self.powder_factor_multiplier),
            ("royaltyRatePerM3", self.royalty_rate_per_m3),
            ("ssclPercentage", self.sscl_percentage),
            ("vatPercentage", self.vat_percentage),
            ("defaultPowderFactor", self.default_powder_factor),
        ]
    }

    /// Check every field and collect all violations.
    pub fn validate_all(&self, bound: PercentageBound) -> Vec<SettingsIssue> {
        let mut issues = Vec::new();
        for (field, value) in self.fields() {
            let is_percentage = field == "ssclPercentage" || field == "vatPercentage";
            let ok = if is_percentage {
                bound.accepts(value)
            } else {
                value.is_finite() && value > 0.0
            };
            if !ok {
                let requirement = if is_percentage {
                    bound.requirement()
                } else {
                    "a positive number"
                };
                issues.push(SettingsIssue {
                    field: field.to_string(),
                    message: format!("Invalid value for {field}. Must be {requirement}."),
                });
            }
        }
        issues
    }

    /// Validate every field. Returns `RoyaltyError::SettingsValidation` naming all
    /// violated constraints.
    pub fn validate(&self, bound: PercentageBound) -> Result<(), RoyaltyError> {
        let issues = self.validate_all(bound);
        if issues.is_empty() {
            return Ok(());
        }
        let messages: Vec<String> = issues.into_iter().map(|i| i.message).collect();
        Err(RoyaltyError::SettingsValidation(messages.join(" ")))
    }
}

impl Default for RoyaltySettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Lower bound applied to the SSCL and VAT percentages.
///
/// The coefficient fields are always strictly positive; percentages may be
/// allowed to be zero (no surcharge / tax-exempt) or required to be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentageBound {
    /// `>= 0`
    #[default]
    NonNegative,
    /// `> 0`
    Positive,
}

impl PercentageBound {
    pub fn from_allow_zero(allow_zero: bool) -> Self {
        if allow_zero {
            PercentageBound::NonNegative
        } else {
            PercentageBound::Positive
        }
    }

    pub fn accepts(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            PercentageBound::NonNegative => value >= 0.0,
            PercentageBound::Positive => value > 0.0,
        }
    }

    fn requirement(&self) -> &'static str {
        match self {
            PercentageBound::NonNegative => "a non-negative number",
            PercentageBound::Positive => "a positive number",
        }
    }
}

/// A single rejected settings field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsIssue {
    pub field: String,
    pub message: String,
}

/// A partial edit: any subset of fields, overlaid on existing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    pub water_gel_multiplier: Option<f64>,
    pub expansion_factor: Option<f64>,
    pub powder_factor_multiplier: Option<f64>,
    pub royalty_rate_per_m3: Option<f64>,
    pub sscl_percentage: Option<f64>,
    pub vat_percentage: Option<f64>,
    pub default_powder_factor: Option<f64>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }

    /// Overlay the set fields on `base`, producing a full replacement.
    pub fn apply(&self, base: RoyaltySettings) -> RoyaltySettings {
        RoyaltySettings {
            water_gel_multiplier: self.water_gel_multiplier.unwrap_or(base.water_gel_multiplier),
            expansion_factor: self.expansion_factor.unwrap_or(base.expansion_factor),
            powder_factor_multiplier: self
                .powder_factor_multiplier
                .unwrap_or(base.powder_factor_multiplier),
            royalty_rate_per_m3: self.royalty_rate_per_m3.unwrap_or(base.royalty_rate_per_m3),
            sscl_percentage: self.sscl_percentage.unwrap_or(base.sscl_percentage),
            vat_percentage: self.vat_percentage.unwrap_or(base.vat_percentage),
            default_powder_factor: self
                .default_powder_factor
                .unwrap_or(base.default_powder_factor),
        }
    }
}
