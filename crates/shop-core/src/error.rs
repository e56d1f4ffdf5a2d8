//! # Shop Error Types
//!
//! Typed error handling for the course-store engine.
//! All store operations return `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for catalog, registry, fulfillment and provider operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Item not found in catalog
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: u32 },

    /// Download code never issued, already redeemed or expired
    #[error("Download code not found or expired")]
    DownloadCodeNotFound,

    /// A required field (email, list id) was absent
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// External provider API error (payment, contacts, mail)
    #[error("Provider error [{provider}]: {message}")]
    Provider { provider: String, message: String },

    /// Network/HTTP error communicating with a provider
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ShopError {
    /// Shorthand for a provider error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ShopError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error came from talking to an external service
    pub fn is_external(&self) -> bool {
        matches!(self, ShopError::Provider { .. } | ShopError::Network(_))
    }

    /// Returns true for the lookups that map to "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ShopError::ItemNotFound { .. } | ShopError::DownloadCodeNotFound
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Configuration(_) => 500,
            ShopError::InvalidRequest(_) => 400,
            ShopError::ItemNotFound { .. } => 404,
            ShopError::DownloadCodeNotFound => 404,
            ShopError::MissingField { .. } => 400,
            ShopError::Provider { .. } => 502,
            ShopError::Network(_) => 503,
            ShopError::Serialization(_) => 500,
        }
    }
}

impl From<serde_json::Error> for ShopError {
    fn from(err: serde_json::Error) -> Self {
        ShopError::Serialization(err.to_string())
    }
}

/// Result type alias for store operations
pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_errors() {
        assert!(ShopError::Network("timeout".into()).is_external());
        assert!(ShopError::provider("brevo", "unauthorized").is_external());
        assert!(!ShopError::ItemNotFound { item_id: 3 }.is_external());
        assert!(!ShopError::MissingField { field: "email" }.is_external());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ShopError::InvalidRequest("test".into()).status_code(), 400);
        assert_eq!(ShopError::ItemNotFound { item_id: 9 }.status_code(), 404);
        assert_eq!(ShopError::provider("stripe", "declined").status_code(), 502);
        assert_eq!(ShopError::Network("reset".into()).status_code(), 503);
    }

    #[test]
    fn test_not_found() {
        assert!(ShopError::DownloadCodeNotFound.is_not_found());
        assert!(ShopError::ItemNotFound { item_id: 1 }.is_not_found());
        assert!(!ShopError::Configuration("x".into()).is_not_found());
    }
}
