//! Emission Data Validation
//!
//! Consumption is measured in kWh, emissions in kg CO2.

use serde::{Deserialize, Serialize};

/// Inclusive bounds for a single reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionDataValidation {
    pub min_consumption: f64,
    pub max_consumption: f64,
    pub min_emissions: f64,
    pub max_emissions: f64,
}

impl Default for EmissionDataValidation {
    fn default() -> Self {
        Self {
            min_consumption: 0.0,
            max_consumption: 1000.0,
            min_emissions: 0.0,
            max_emissions: 500.0,
        }
    }
}

/// Outcome of validating one reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Stateless validator; safe to share across any number of callers
#[derive(Debug, Clone, Default)]
pub struct EmissionDataValidator {
    bounds: EmissionDataValidation,
}

impl EmissionDataValidator {
    pub fn new(bounds: EmissionDataValidation) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &EmissionDataValidation {
        &self.bounds
    }

    /// Validate against the configured bounds
    pub fn validate(&self, consumption: f64, emissions: f64) -> ValidationResult {
        Self::validate_with(consumption, emissions, &self.bounds)
    }

    /// Validate against explicit bounds. Both checks always run.
    pub fn validate_with(
        consumption: f64,
        emissions: f64,
        bounds: &EmissionDataValidation,
    ) -> ValidationResult {
        let mut errors = Vec::new();

        // NaN fails both comparisons, so test for containment rather than violation
        if !(consumption >= bounds.min_consumption && consumption <= bounds.max_consumption) {
            errors.push(format!(
                "Energy consumption must be between {} and {} kWh",
                bounds.min_consumption, bounds.max_consumption
            ));
        }

        if !(emissions >= bounds.min_emissions && emissions <= bounds.max_emissions) {
            errors.push(format!(
                "CO2 emissions must be between {} and {} kg",
                bounds.min_emissions, bounds.max_emissions
            ));
        }

        ValidationResult::from_errors(errors)
    }
}
