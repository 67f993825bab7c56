//! Prediction Store Implementation

use crate::records::{
    CropPredictionRecord, DiseasePredictionRecord, StoredCropPrediction,
    StoredDiseasePrediction, CROP_TABLE, DISEASE_TABLE,
};
use crate::settings::{StoreConfig, DEFAULT_HISTORY_LIMIT};
use crate::StoreError;
use data_validator::Validator;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use supabase_rest::{InsertResponse, SelectQuery, SupabaseClient, TableBackend};
use tracing::{debug, error, info};

/// Recent predictions of both kinds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionHistory {
    pub crop: Vec<StoredCropPrediction>,
    pub disease: Vec<StoredDiseasePrediction>,
}

impl PredictionHistory {
    pub fn crop_count(&self) -> usize {
        self.crop.len()
    }

    pub fn disease_count(&self) -> usize {
        self.disease.len()
    }

    pub fn total(&self) -> usize {
        self.crop.len() + self.disease.len()
    }
}

/// Persists predictions to the remote tables
///
/// Each save or read is a single round trip; nothing is buffered or retried.
#[derive(Debug, Clone)]
pub struct PredictionStore<B = SupabaseClient> {
    backend: B,
    /// Range checks applied before insert, when enabled
    validator: Option<Validator>,
    history_limit: usize,
}

impl PredictionStore<SupabaseClient> {
    /// Create a store backed by Supabase
    pub fn from_config(config: StoreConfig) -> Result<Self, StoreError> {
        let client = SupabaseClient::new(config.supabase)?;
        let mut store = Self::new(client).with_history_limit(config.history_limit);
        if config.validate_inputs {
            store = store.with_validation(Validator::default());
        }
        Ok(store)
    }

    /// Create a store from `SUPABASE_*` environment variables
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_config(StoreConfig::from_env()?)
    }
}

impl<B: TableBackend> PredictionStore<B> {
    pub fn new(backend: B) -> Self {
        info!("Creating prediction store");
        Self {
            backend,
            validator: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Reject out-of-range records before they are sent
    pub fn with_validation(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Save a crop recommendation built from the caller's soil/climate
    /// mapping and model result.
    ///
    /// Best effort: any failure, including a missing key in either mapping,
    /// is logged and reported as `None`.
    pub async fn save_crop_prediction(
        &self,
        user_id: Option<&str>,
        data: &Value,
        result: &Value,
    ) -> Option<InsertResponse> {
        match self.try_save_crop(user_id, data, result).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!("Error saving crop prediction: {}", e);
                None
            }
        }
    }

    /// Save a disease detection built from the caller's model result.
    ///
    /// Same failure policy as [`save_crop_prediction`](Self::save_crop_prediction).
    pub async fn save_disease_prediction(
        &self,
        user_id: Option<&str>,
        result: &Value,
    ) -> Option<InsertResponse> {
        match self.try_save_disease(user_id, result).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!("Error saving disease prediction: {}", e);
                None
            }
        }
    }

    async fn try_save_crop(
        &self,
        user_id: Option<&str>,
        data: &Value,
        result: &Value,
    ) -> Result<InsertResponse, StoreError> {
        let record = CropPredictionRecord::from_mappings(user_id, data, result)?;
        self.insert_crop(&record).await
    }

    async fn try_save_disease(
        &self,
        user_id: Option<&str>,
        result: &Value,
    ) -> Result<InsertResponse, StoreError> {
        let record = DiseasePredictionRecord::from_mappings(user_id, result)?;
        self.insert_disease(&record).await
    }

    /// Insert a crop recommendation row
    pub async fn insert_crop(
        &self,
        record: &CropPredictionRecord,
    ) -> Result<InsertResponse, StoreError> {
        if let Some(validator) = &self.validator {
            let outcome = record.validate(validator);
            if !outcome.valid {
                return Err(StoreError::Validation(outcome));
            }
        }
        self.insert_row(CROP_TABLE, record).await
    }

    /// Insert a disease detection row
    pub async fn insert_disease(
        &self,
        record: &DiseasePredictionRecord,
    ) -> Result<InsertResponse, StoreError> {
        if let Some(validator) = &self.validator {
            let outcome = record.validate(validator);
            if !outcome.valid {
                return Err(StoreError::Validation(outcome));
            }
        }
        self.insert_row(DISEASE_TABLE, record).await
    }

    async fn insert_row<T: Serialize>(
        &self,
        table: &'static str,
        record: &T,
    ) -> Result<InsertResponse, StoreError> {
        let payload = serde_json::to_value(record)?;
        let response = self.backend.insert(table, &payload).await?;
        debug!(table, status = response.status, "Inserted prediction");
        Ok(response)
    }

    /// Most recent crop recommendations, newest first
    pub async fn recent_crop_predictions(
        &self,
        limit: usize,
    ) -> Result<Vec<StoredCropPrediction>, StoreError> {
        self.recent(CROP_TABLE, limit).await
    }

    /// Most recent disease detections, newest first
    pub async fn recent_disease_predictions(
        &self,
        limit: usize,
    ) -> Result<Vec<StoredDiseasePrediction>, StoreError> {
        self.recent(DISEASE_TABLE, limit).await
    }

    /// Recent predictions of both kinds, using the configured limit per kind
    pub async fn history(&self) -> Result<PredictionHistory, StoreError> {
        let (crop, disease) = tokio::try_join!(
            self.recent_crop_predictions(self.history_limit),
            self.recent_disease_predictions(self.history_limit),
        )?;

        debug!(
            crop = crop.len(),
            disease = disease.len(),
            "Loaded prediction history"
        );

        Ok(PredictionHistory { crop, disease })
    }

    async fn recent<T: DeserializeOwned>(
        &self,
        table: &'static str,
        limit: usize,
    ) -> Result<Vec<T>, StoreError> {
        let query = SelectQuery::new().order_desc("created_at").limit(limit);
        let rows = self.backend.select(table, &query).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use supabase_rest::SupabaseError;

    /// Records every call instead of talking to a backend
    #[derive(Clone, Default)]
    struct RecordingBackend {
        inserts: Arc<Mutex<Vec<(String, Value)>>>,
        selects: Arc<Mutex<Vec<(String, SelectQuery)>>>,
        fail_status: Option<u16>,
        rows: Vec<Value>,
    }

    impl RecordingBackend {
        fn failing(status: u16) -> Self {
            Self {
                fail_status: Some(status),
                ..Default::default()
            }
        }

        fn inserts(&self) -> Vec<(String, Value)> {
            self.inserts.lock().unwrap().clone()
        }
    }

    impl TableBackend for RecordingBackend {
        async fn insert(
            &self,
            table: &str,
            payload: &Value,
        ) -> Result<InsertResponse, SupabaseError> {
            self.inserts
                .lock()
                .unwrap()
                .push((table.to_string(), payload.clone()));
            match self.fail_status {
                Some(status) => Err(SupabaseError::ServiceError {
                    status,
                    message: "rejected".to_string(),
                }),
                None => Ok(InsertResponse {
                    status: 201,
                    data: vec![payload.clone()],
                }),
            }
        }

        async fn select(
            &self,
            table: &str,
            query: &SelectQuery,
        ) -> Result<Vec<Value>, SupabaseError> {
            self.selects
                .lock()
                .unwrap()
                .push((table.to_string(), query.clone()));
            match self.fail_status {
                Some(status) => Err(SupabaseError::ServiceError {
                    status,
                    message: "rejected".to_string(),
                }),
                None => Ok(self.rows.clone()),
            }
        }
    }

    fn soil() -> Value {
        json!({
            "N": 90, "P": 42, "K": 43,
            "temperature": 20.87, "humidity": 82.0, "ph": 6.5, "rainfall": 202.93
        })
    }

    fn crop_result() -> Value {
        json!({ "recommended_crop": "rice", "confidence": 97.5 })
    }

    fn disease_result() -> Value {
        json!({
            "disease": "Apple___Apple_scab",
            "confidence": 91.2,
            "top_predictions": [
                { "disease": "Apple___Apple_scab", "confidence": 91.2 },
                { "disease": "Apple___Black_rot", "confidence": 6.3 },
                { "disease": "Apple___healthy", "confidence": 1.1 }
            ]
        })
    }

    #[tokio::test]
    async fn test_crop_save_issues_one_insert() {
        let backend = RecordingBackend::default();
        let store = PredictionStore::new(backend.clone());

        let response = store
            .save_crop_prediction(Some("user-1"), &soil(), &crop_result())
            .await
            .unwrap();
        assert_eq!(response.status, 201);

        let inserts = backend.inserts();
        assert_eq!(inserts.len(), 1);
        let (table, payload) = &inserts[0];
        assert_eq!(table, CROP_TABLE);
        assert_eq!(payload["user_id"], "user-1");
        assert_eq!(payload["nitrogen"], 90.0);
        assert_eq!(payload["phosphorus"], 42.0);
        assert_eq!(payload["potassium"], 43.0);
        assert_eq!(payload["rainfall"], 202.93);
        assert_eq!(payload["recommended_crop"], "rice");
        assert_eq!(payload["confidence"], 97.5);
        assert_eq!(payload.as_object().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_disease_save_issues_one_insert() {
        let backend = RecordingBackend::default();
        let store = PredictionStore::new(backend.clone());

        assert!(store
            .save_disease_prediction(Some("user-1"), &disease_result())
            .await
            .is_some());

        let inserts = backend.inserts();
        assert_eq!(inserts.len(), 1);
        let (table, payload) = &inserts[0];
        assert_eq!(table, DISEASE_TABLE);
        assert_eq!(payload["detected_disease"], "Apple___Apple_scab");
        assert_eq!(payload["top_predictions"].as_array().unwrap().len(), 3);
        assert_eq!(payload["top_predictions"][2]["disease"], "Apple___healthy");
        assert_eq!(payload.as_object().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_backend_failure_returns_none() {
        let backend = RecordingBackend::failing(500);
        let store = PredictionStore::new(backend.clone());

        assert!(store
            .save_crop_prediction(None, &soil(), &crop_result())
            .await
            .is_none());
        assert!(store
            .save_disease_prediction(None, &disease_result())
            .await
            .is_none());
        assert_eq!(backend.inserts().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_key_swallowed_before_network() {
        let backend = RecordingBackend::default();
        let store = PredictionStore::new(backend.clone());

        let mut data = soil();
        data.as_object_mut().unwrap().remove("K");
        assert!(store
            .save_crop_prediction(None, &data, &crop_result())
            .await
            .is_none());

        let result = json!({ "disease": "Apple___Apple_scab", "confidence": 91.2 });
        assert!(store.save_disease_prediction(None, &result).await.is_none());

        assert!(backend.inserts().is_empty());
    }

    #[tokio::test]
    async fn test_unvalidated_values_reach_backend_as_given() {
        let backend = RecordingBackend::default();
        let store = PredictionStore::new(backend.clone());

        let result = json!({ "recommended_crop": "rice", "confidence": "97.3" });
        assert!(store
            .save_crop_prediction(Some("u"), &soil(), &result)
            .await
            .is_some());

        let top_k = json!([
            { "disease": "Apple___Apple_scab", "confidence": 90.0, "class_index": 3 },
            { "confidence": "90%" }
        ]);
        let result = json!({
            "disease": "Apple___Apple_scab",
            "confidence": 90.0,
            "top_predictions": top_k.clone()
        });
        assert!(store.save_disease_prediction(None, &result).await.is_some());

        let inserts = backend.inserts();
        assert_eq!(inserts.len(), 2);
        assert_eq!(inserts[0].1["confidence"], json!("97.3"));
        assert_eq!(inserts[1].1["top_predictions"], top_k);
    }

    #[tokio::test]
    async fn test_validation_rejects_non_numeric_confidence() {
        let backend = RecordingBackend::default();
        let store = PredictionStore::new(backend.clone()).with_validation(Validator::default());

        let result = json!({ "recommended_crop": "rice", "confidence": "97.3" });
        assert!(store
            .save_crop_prediction(None, &soil(), &result)
            .await
            .is_none());
        assert!(backend.inserts().is_empty());
    }

    #[tokio::test]
    async fn test_typed_insert_exposes_cause() {
        let store = PredictionStore::new(RecordingBackend::failing(401));
        let record = CropPredictionRecord::from_mappings(None, &soil(), &crop_result()).unwrap();

        match store.insert_crop(&record).await {
            Err(StoreError::Backend(e)) => assert!(e.is_auth_failure()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validation_blocks_out_of_range_record() {
        let backend = RecordingBackend::default();
        let store = PredictionStore::new(backend.clone()).with_validation(Validator::default());

        let mut data = soil();
        data["humidity"] = json!(140.0);
        assert!(store
            .save_crop_prediction(None, &data, &crop_result())
            .await
            .is_none());
        assert!(backend.inserts().is_empty());

        let record = CropPredictionRecord::from_mappings(None, &data, &crop_result()).unwrap();
        assert!(matches!(
            store.insert_crop(&record).await,
            Err(StoreError::Validation(_))
        ));

        assert!(store
            .save_crop_prediction(None, &soil(), &crop_result())
            .await
            .is_some());
        assert_eq!(backend.inserts().len(), 1);
    }

    #[tokio::test]
    async fn test_without_validation_range_is_not_checked() {
        let backend = RecordingBackend::default();
        let store = PredictionStore::new(backend.clone());

        let mut data = soil();
        data["ph"] = json!(42.0);
        assert!(store
            .save_crop_prediction(None, &data, &crop_result())
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_history_queries_newest_first() {
        let backend = RecordingBackend {
            rows: vec![json!({
                "id": 3,
                "created_at": "2025-03-14T09:26:53+00:00",
                "user_id": "user-1",
                "nitrogen": 90.0, "phosphorus": 42.0, "potassium": 43.0,
                "temperature": 20.87, "humidity": 82.0, "ph": 6.5, "rainfall": 202.93,
                "recommended_crop": "rice",
                "confidence": 97.5
            })],
            ..Default::default()
        };
        let store = PredictionStore::new(backend.clone()).with_history_limit(5);

        let crops = store.recent_crop_predictions(5).await.unwrap();
        assert_eq!(crops.len(), 1);
        assert_eq!(crops[0].id, 3);
        assert_eq!(crops[0].record.recommended_crop, "rice");

        let selects = backend.selects.lock().unwrap().clone();
        assert_eq!(selects.len(), 1);
        assert_eq!(selects[0].0, CROP_TABLE);
        assert_eq!(
            selects[0].1,
            SelectQuery::new().order_desc("created_at").limit(5)
        );
    }

    #[tokio::test]
    async fn test_history_counts() {
        let store = PredictionStore::new(RecordingBackend::default());
        let history = store.history().await.unwrap();
        assert_eq!(history.total(), 0);
        assert_eq!(history.crop_count(), 0);
        assert_eq!(history.disease_count(), 0);

        let selects = store.backend().selects.lock().unwrap().clone();
        assert_eq!(selects.len(), 2);
        assert!(selects.iter().all(|(_, q)| q.limit == Some(DEFAULT_HISTORY_LIMIT)));
    }

    #[tokio::test]
    async fn test_history_propagates_backend_error() {
        let store = PredictionStore::new(RecordingBackend::failing(503));
        assert!(matches!(
            store.history().await,
            Err(StoreError::Backend(_))
        ));
    }

    #[test]
    fn test_from_config_enables_validation() {
        let config = StoreConfig {
            supabase: supabase_rest::SupabaseConfig::new("https://abcd.supabase.co", "service-key"),
            validate_inputs: true,
            history_limit: 10,
        };
        let store = PredictionStore::from_config(config).unwrap();
        assert!(store.validator.is_some());
        assert_eq!(store.history_limit(), 10);
    }
}
