//! Request and response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of an insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertResponse {
    /// HTTP status returned by the backend (201 on success)
    pub status: u16,
    /// Rows echoed back by the backend
    pub data: Vec<Value>,
}

/// Sort order for a select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    fn to_param(&self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Query for reading rows from a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    /// Column list, `*` for all
    pub columns: String,
    /// Sort order
    pub order: Option<Order>,
    /// Maximum rows to return
    pub limit: Option<usize>,
}

impl Default for SelectQuery {
    fn default() -> Self {
        Self {
            columns: "*".to_string(),
            order: None,
            limit: None,
        }
    }
}

impl SelectQuery {
    /// Select all columns, unordered, unlimited
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// PostgREST query-string parameters
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("select", self.columns.clone())];
        if let Some(order) = &self.order {
            params.push(("order", order.to_param()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}
