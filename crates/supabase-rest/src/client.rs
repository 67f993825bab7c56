//! Supabase Client Implementation
//!
//! Async HTTP client for PostgREST table inserts and selects. One request per
//! call: no retries, no batching.

use crate::{
    config::SupabaseConfig,
    error::SupabaseError,
    types::{InsertResponse, SelectQuery},
    TableBackend,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
}

/// Supabase REST client
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: SupabaseConfig,
}

impl SupabaseClient {
    /// Create a new client with configuration
    pub fn new(config: SupabaseConfig) -> Result<Self, SupabaseError> {
        config.validate().map_err(SupabaseError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        info!(url = %config.url, "Created Supabase client");

        Ok(Self { client, config })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.service_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.service_key),
            )
    }

    /// Insert one row, returning the representation echoed by the backend
    pub async fn insert(
        &self,
        table: &str,
        payload: &Value,
    ) -> Result<InsertResponse, SupabaseError> {
        let url = self.config.table_url(table);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let data = read_rows(response).await?;

        debug!(table, status, rows = data.len(), "Insert completed");

        Ok(InsertResponse { status, data })
    }

    /// Select rows from a table
    pub async fn select(
        &self,
        table: &str,
        query: &SelectQuery,
    ) -> Result<Vec<Value>, SupabaseError> {
        let url = self.config.table_url(table);

        let response = self
            .authorized(self.client.get(&url))
            .query(&query.to_params())
            .send()
            .await?;

        let rows = read_rows(response).await?;

        debug!(table, rows = rows.len(), "Select completed");

        Ok(rows)
    }
}

impl TableBackend for SupabaseClient {
    async fn insert(&self, table: &str, payload: &Value) -> Result<InsertResponse, SupabaseError> {
        SupabaseClient::insert(self, table, payload).await
    }

    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Vec<Value>, SupabaseError> {
        SupabaseClient::select(self, table, query).await
    }
}

/// Decode a row array, mapping non-success statuses to `ServiceError`
async fn read_rows(response: Response) -> Result<Vec<Value>, SupabaseError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<PostgrestError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        return Err(SupabaseError::ServiceError {
            status: status.as_u16(),
            message,
        });
    }

    // `return=minimal` and 204 responses carry no body
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_str(&body)?)
}
