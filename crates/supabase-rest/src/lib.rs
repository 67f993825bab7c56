//! Supabase REST Client
//!
//! Thin async client for the PostgREST interface Supabase exposes under
//! `/rest/v1/`. Covers the two table operations the prediction store needs:
//! appending a row and reading recent rows back.

mod client;
mod config;
mod error;
mod types;

pub use client::SupabaseClient;
pub use config::{SupabaseConfig, DEFAULT_TIMEOUT_MS};
pub use error::SupabaseError;
pub use types::{InsertResponse, Order, SelectQuery};

use serde_json::Value;
use std::future::Future;

/// Remote table operations.
///
/// Implemented by [`SupabaseClient`] for the hosted backend. Callers that
/// persist through this trait can be exercised against an in-process double.
pub trait TableBackend: Send + Sync {
    /// Append one row to `table`.
    fn insert(
        &self,
        table: &str,
        payload: &Value,
    ) -> impl Future<Output = Result<InsertResponse, SupabaseError>> + Send;

    /// Read rows from `table`.
    fn select(
        &self,
        table: &str,
        query: &SelectQuery,
    ) -> impl Future<Output = Result<Vec<Value>, SupabaseError>> + Send;
}
