//! # Brevo Configuration
//!
//! API key and sender identity, loaded from environment variables.

use serde::Serialize;
use shop_core::ShopError;
use std::env;

const DEFAULT_API_BASE_URL: &str = "https://api.brevo.com/v3";

/// Name and address transactional emails are sent from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sender {
    pub name: String,
    pub email: String,
}

/// Brevo API configuration
#[derive(Debug, Clone)]
pub struct BrevoConfig {
    /// API key sent in the `api-key` header
    pub api_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Sender and reply-to identity
    pub sender: Sender,
}

impl BrevoConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `BREVO_API_KEY` (or the legacy `SEND_IN_BLUE_API_KEY`)
    /// - `MAIL_SENDER_EMAIL`
    ///
    /// Optional: `MAIL_SENDER_NAME`
    pub fn from_env() -> Result<Self, ShopError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("BREVO_API_KEY")
            .or_else(|_| env::var("SEND_IN_BLUE_API_KEY"))
            .map_err(|_| ShopError::Configuration("BREVO_API_KEY not set".to_string()))?;

        let sender_email = env::var("MAIL_SENDER_EMAIL")
            .map_err(|_| ShopError::Configuration("MAIL_SENDER_EMAIL not set".to_string()))?;

        if !sender_email.contains('@') {
            return Err(ShopError::Configuration(
                "MAIL_SENDER_EMAIL must be an email address".to_string(),
            ));
        }

        let sender_name = env::var("MAIL_SENDER_NAME").unwrap_or_else(|_| sender_email.clone());

        Ok(Self::new(api_key, sender_name, sender_email))
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        api_key: impl Into<String>,
        sender_name: impl Into<String>,
        sender_email: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            sender: Sender {
                name: sender_name.into(),
                email: sender_email.into(),
            },
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}
