//! Supabase client errors

use thiserror::Error;

/// Errors from the Supabase REST client
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend returned a non-success status
    #[error("Service error: {status} - {message}")]
    ServiceError { status: u16, message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SupabaseError {
    /// HTTP status reported by the backend, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::ServiceError { status, .. } => Some(*status),
            SupabaseError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the backend rejected the service key
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_auth_failure() {
        let err = SupabaseError::ServiceError {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.is_auth_failure());
        assert_eq!(err.to_string(), "Service error: 401 - Invalid API key");

        let err = SupabaseError::InvalidConfig("url cannot be empty".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_auth_failure());
    }
}
