//! Prediction Store
//!
//! Persists crop recommendations and disease detections to Supabase.
//!
//! The free functions [`save_crop_prediction`] and [`save_disease_prediction`]
//! use a process-wide store built from `SUPABASE_URL` and
//! `SUPABASE_SERVICE_KEY` on first use. Both are best effort: any failure is
//! logged and reported as `None`. Callers that need the failure cause hold a
//! [`PredictionStore`] and use its `insert_*` methods.

mod logging;
mod records;
mod settings;
mod store;

pub use logging::init_logging;
pub use records::{
    CropPredictionRecord, DiseasePredictionRecord, PayloadError, StoredCropPrediction,
    StoredDiseasePrediction, CROP_TABLE, DISEASE_TABLE,
};
pub use settings::{ConfigError, StoreConfig, DEFAULT_HISTORY_LIMIT};
pub use store::{PredictionHistory, PredictionStore};
pub use supabase_rest::InsertResponse;

use data_validator::ValidationResult;
use serde_json::Value;
use std::sync::OnceLock;
use supabase_rest::SupabaseError;
use thiserror::Error;
use tracing::error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid payload: {0}")]
    Payload(#[from] PayloadError),
    #[error("Validation failed: {0}")]
    Validation(ValidationResult),
    #[error("Backend error: {0}")]
    Backend(#[from] SupabaseError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Prediction store unavailable: {0}")]
    Unavailable(String),
}

static DEFAULT_STORE: OnceLock<Result<PredictionStore, String>> = OnceLock::new();

/// Process-wide store, built from the environment on first call.
///
/// Initialization runs once; a configuration failure is remembered and
/// returned to every later caller.
pub fn default_store() -> Result<&'static PredictionStore, StoreError> {
    DEFAULT_STORE
        .get_or_init(|| PredictionStore::from_env().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| StoreError::Unavailable(e.clone()))
}

/// Save a crop recommendation through the process-wide store
pub async fn save_crop_prediction(
    user_id: Option<&str>,
    data: &Value,
    result: &Value,
) -> Option<InsertResponse> {
    match default_store() {
        Ok(store) => store.save_crop_prediction(user_id, data, result).await,
        Err(e) => {
            error!("Error saving crop prediction: {}", e);
            None
        }
    }
}

/// Save a disease detection through the process-wide store
pub async fn save_disease_prediction(
    user_id: Option<&str>,
    result: &Value,
) -> Option<InsertResponse> {
    match default_store() {
        Ok(store) => store.save_disease_prediction(user_id, result).await,
        Err(e) => {
            error!("Error saving disease prediction: {}", e);
            None
        }
    }
}
