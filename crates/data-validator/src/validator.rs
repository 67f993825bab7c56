//! Data Validator for Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Nitrogen valid range (kg/ha)
    pub nitrogen_range: (f64, f64),
    /// Phosphorus valid range (kg/ha)
    pub phosphorus_range: (f64, f64),
    /// Potassium valid range (kg/ha)
    pub potassium_range: (f64, f64),
    /// Temperature valid range (°C)
    pub temperature_range: (f64, f64),
    /// Relative humidity valid range (%)
    pub humidity_range: (f64, f64),
    /// Soil pH valid range
    pub ph_range: (f64, f64),
    /// Rainfall valid range (mm)
    pub rainfall_range: (f64, f64),
    /// Model confidence valid range (%)
    pub confidence_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            nitrogen_range: (0.0, 200.0),
            phosphorus_range: (0.0, 200.0),
            potassium_range: (0.0, 200.0),
            temperature_range: (-20.0, 60.0),
            humidity_range: (0.0, 100.0),
            ph_range: (0.0, 14.0),
            rainfall_range: (0.0, 500.0),
            confidence_range: (0.0, 100.0),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Collect individual field checks into one result
    pub fn from_checks<I>(checks: I) -> Self
    where
        I: IntoIterator<Item = Result<(), ValidationError>>,
    {
        let mut fields_checked = 0;
        let mut errors = Vec::new();
        for check in checks {
            fields_checked += 1;
            if let Err(e) = check {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Self::valid(fields_checked)
        } else {
            debug!(
                failed = errors.len(),
                fields_checked, "Validation rejected input"
            );
            Self {
                valid: false,
                errors,
                fields_checked,
            }
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return write!(f, "{} fields valid", self.fields_checked);
        }
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Validator for prediction inputs
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    pub fn validate_nitrogen(&self, value: f64) -> Result<(), ValidationError> {
        self.validate_range("nitrogen", value, self.config.nitrogen_range)
    }

    pub fn validate_phosphorus(&self, value: f64) -> Result<(), ValidationError> {
        self.validate_range("phosphorus", value, self.config.phosphorus_range)
    }

    pub fn validate_potassium(&self, value: f64) -> Result<(), ValidationError> {
        self.validate_range("potassium", value, self.config.potassium_range)
    }

    pub fn validate_temperature(&self, value: f64) -> Result<(), ValidationError> {
        self.validate_range("temperature", value, self.config.temperature_range)
    }

    pub fn validate_humidity(&self, value: f64) -> Result<(), ValidationError> {
        self.validate_range("humidity", value, self.config.humidity_range)
    }

    pub fn validate_ph(&self, value: f64) -> Result<(), ValidationError> {
        self.validate_range("ph", value, self.config.ph_range)
    }

    pub fn validate_rainfall(&self, value: f64) -> Result<(), ValidationError> {
        self.validate_range("rainfall", value, self.config.rainfall_range)
    }

    /// Validate a model confidence percentage
    pub fn validate_confidence(&self, value: f64) -> Result<(), ValidationError> {
        self.validate_range("confidence", value, self.config.confidence_range)
    }

    /// Check that ranked confidences never increase down the list
    pub fn validate_ranking(&self, confidences: &[f64]) -> Result<(), ValidationError> {
        match confidences.windows(2).position(|pair| pair[1] > pair[0]) {
            Some(i) => Err(ValidationError::UnorderedRanking { index: i + 1 }),
            None => Ok(()),
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ph_range() {
        let validator = Validator::default();
        assert!(validator.validate_ph(0.0).is_ok());
        assert!(validator.validate_ph(6.5).is_ok());
        assert!(validator.validate_ph(14.0).is_ok());
        assert!(validator.validate_ph(-0.1).is_err());
        assert!(validator.validate_ph(14.5).is_err());
    }

    #[test]
    fn test_out_of_range_error_message() {
        let validator = Validator::default();
        let err = validator.validate_humidity(120.0).unwrap_err();
        assert_eq!(err.to_string(), "humidity value 120 is out of range [0, 100]");
    }

    #[test]
    fn test_non_finite_rejected() {
        let validator = Validator::default();
        assert_eq!(
            validator.validate_rainfall(f64::NAN),
            Err(ValidationError::NotFinite { field: "rainfall" })
        );
        assert!(validator.validate_temperature(f64::INFINITY).is_err());
    }

    #[test]
    fn test_ranking_order() {
        let validator = Validator::default();
        assert!(validator.validate_ranking(&[]).is_ok());
        assert!(validator.validate_ranking(&[91.0, 5.0, 5.0, 1.0]).is_ok());
        assert_eq!(
            validator.validate_ranking(&[91.0, 3.0, 4.0]),
            Err(ValidationError::UnorderedRanking { index: 2 })
        );
    }

    #[test]
    fn test_from_checks_collects_failures() {
        let validator = Validator::default();
        let result = ValidationResult::from_checks([
            validator.validate_nitrogen(90.0),
            validator.validate_ph(20.0),
            validator.validate_confidence(101.0),
        ]);

        assert!(!result.valid);
        assert_eq!(result.fields_checked, 3);
        assert_eq!(result.errors.len(), 2);
        assert!(result.to_string().contains("ph value 20"));
        assert!(result.to_string().contains("; confidence value 101"));

        let result = ValidationResult::from_checks([validator.validate_nitrogen(90.0)]);
        assert_eq!(result, ValidationResult::valid(1));
    }

    proptest! {
        #[test]
        fn confidence_in_range_is_accepted(value in 0.0f64..=100.0) {
            prop_assert!(Validator::default().validate_confidence(value).is_ok());
        }

        #[test]
        fn confidence_above_range_is_rejected(value in 100.0001f64..1.0e6) {
            prop_assert!(Validator::default().validate_confidence(value).is_err());
        }
    }
}
