//! Prediction Records
//!
//! Row shapes for the `crop_predictions` and `disease_predictions` tables and
//! their construction from the loosely-typed mappings the inference service
//! produces. Values are carried through as given; only a missing key stops a
//! record from being built.

use chrono::{DateTime, Utc};
use data_validator::{ValidationError, ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Remote table holding crop recommendations
pub const CROP_TABLE: &str = "crop_predictions";

/// Remote table holding disease detections
pub const DISEASE_TABLE: &str = "disease_predictions";

/// Errors while building a record from caller mappings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Key absent from the mapping
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

fn field(map: &Value, key: &'static str) -> Result<Value, PayloadError> {
    map.get(key).cloned().ok_or(PayloadError::MissingField(key))
}

/// Read `value` as a number and range-check it
fn numeric<F>(field: &'static str, value: &Value, check: F) -> Result<(), ValidationError>
where
    F: FnOnce(f64) -> Result<(), ValidationError>,
{
    value
        .as_f64()
        .ok_or(ValidationError::NotANumber { field })
        .and_then(check)
}

fn label(field: &'static str, value: &Value) -> Result<(), ValidationError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field,
            reason: "expected a non-empty string",
        }),
    }
}

/// Crop recommendation row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPredictionRecord {
    pub user_id: Option<String>,
    pub nitrogen: Value,
    pub phosphorus: Value,
    pub potassium: Value,
    pub temperature: Value,
    pub humidity: Value,
    pub ph: Value,
    pub rainfall: Value,
    pub recommended_crop: Value,
    /// Confidence percentage
    pub confidence: Value,
}

impl CropPredictionRecord {
    /// Build a row from the soil/climate mapping (`N`, `P`, `K`,
    /// `temperature`, `humidity`, `ph`, `rainfall`) and the model result
    /// (`recommended_crop`, `confidence`).
    pub fn from_mappings(
        user_id: Option<&str>,
        data: &Value,
        result: &Value,
    ) -> Result<Self, PayloadError> {
        Ok(Self {
            user_id: user_id.map(str::to_string),
            nitrogen: field(data, "N")?,
            phosphorus: field(data, "P")?,
            potassium: field(data, "K")?,
            temperature: field(data, "temperature")?,
            humidity: field(data, "humidity")?,
            ph: field(data, "ph")?,
            rainfall: field(data, "rainfall")?,
            recommended_crop: field(result, "recommended_crop")?,
            confidence: field(result, "confidence")?,
        })
    }

    pub fn validate(&self, validator: &Validator) -> ValidationResult {
        ValidationResult::from_checks([
            numeric("nitrogen", &self.nitrogen, |v| validator.validate_nitrogen(v)),
            numeric("phosphorus", &self.phosphorus, |v| validator.validate_phosphorus(v)),
            numeric("potassium", &self.potassium, |v| validator.validate_potassium(v)),
            numeric("temperature", &self.temperature, |v| validator.validate_temperature(v)),
            numeric("humidity", &self.humidity, |v| validator.validate_humidity(v)),
            numeric("ph", &self.ph, |v| validator.validate_ph(v)),
            numeric("rainfall", &self.rainfall, |v| validator.validate_rainfall(v)),
            label("recommended_crop", &self.recommended_crop),
            numeric("confidence", &self.confidence, |v| validator.validate_confidence(v)),
        ])
    }
}

/// Disease detection row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseasePredictionRecord {
    pub user_id: Option<String>,
    pub detected_disease: Value,
    pub confidence: Value,
    /// Top-k list as produced by the model, best first
    pub top_predictions: Value,
}

impl DiseasePredictionRecord {
    /// Build a row from the model result (`disease`, `confidence`,
    /// `top_predictions`).
    pub fn from_mappings(user_id: Option<&str>, result: &Value) -> Result<Self, PayloadError> {
        Ok(Self {
            user_id: user_id.map(str::to_string),
            detected_disease: field(result, "disease")?,
            confidence: field(result, "confidence")?,
            top_predictions: field(result, "top_predictions")?,
        })
    }

    pub fn validate(&self, validator: &Validator) -> ValidationResult {
        let mut checks = vec![
            label("detected_disease", &self.detected_disease),
            numeric("confidence", &self.confidence, |v| validator.validate_confidence(v)),
        ];

        match self.top_predictions.as_array() {
            Some(entries) => {
                let mut ranked = Vec::with_capacity(entries.len());
                for entry in entries {
                    let confidence = entry.get("confidence").unwrap_or(&Value::Null);
                    checks.push(numeric("top_predictions.confidence", confidence, |v| {
                        ranked.push(v);
                        validator.validate_confidence(v)
                    }));
                }
                checks.push(validator.validate_ranking(&ranked));
            }
            None => checks.push(Err(ValidationError::InvalidFormat {
                field: "top_predictions",
                reason: "expected a list",
            })),
        }

        ValidationResult::from_checks(checks)
    }
}

/// Crop prediction as read back from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCropPrediction {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: CropPredictionRecord,
}

/// Disease prediction as read back from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDiseasePrediction {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: DiseasePredictionRecord,
}
