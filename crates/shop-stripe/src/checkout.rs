//! # Stripe Checkout Sessions
//!
//! Implementation of the Stripe Checkout Sessions API.
//! Opens hosted payment pages and reads back who paid.

use crate::config::StripeConfig;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shop_core::{
    CheckoutRequest, CheckoutSession, PaidSession, PaymentStrategy, ShopError, ShopResult,
};
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe Checkout Session strategy
///
/// Uses Stripe's hosted checkout page; card data never touches this server.
pub struct StripeCheckoutStrategy {
    config: StripeConfig,
    client: Client,
}

impl StripeCheckoutStrategy {
    /// Create a new Stripe checkout strategy
    pub fn new(config: StripeConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Stripe client initialized ({} mode)",
            if config.is_test_mode() { "test" } else { "live" }
        );

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    /// Build form data for the Stripe API
    fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
        vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.as_str().to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.name.clone(),
            ),
            (
                "line_items[0][quantity]".to_string(),
                request.quantity.to_string(),
            ),
            ("metadata[item_id]".to_string(), request.item_id.to_string()),
        ]
    }
}

#[async_trait]
impl PaymentStrategy for StripeCheckoutStrategy {
    #[instrument(skip(self, request), fields(item_id = request.item_id))]
    async fn create_checkout(&self, request: &CheckoutRequest) -> ShopResult<CheckoutSession> {
        let form_params = Self::checkout_form(request);
        debug!(
            "Creating Stripe checkout session: amount={} {}",
            request.unit_amount, request.currency
        );

        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let session: StripeCheckoutSessionResponse = read_response(response).await?;

        info!("Created Stripe checkout session: id={}", session.id);

        Ok(CheckoutSession {
            session_id: session.id,
            checkout_url: session.url,
            provider: PROVIDER.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn retrieve_session(&self, session_id: &str) -> ShopResult<PaidSession> {
        if session_id.is_empty()
            || !session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ShopError::InvalidRequest(format!(
                "Malformed checkout session id: {:?}",
                session_id
            )));
        }

        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let session: StripeCheckoutSessionResponse = read_response(response).await?;

        debug!(
            "Retrieved Stripe checkout session: id={}, payment_status={:?}",
            session.id, session.payment_status
        );

        let customer_email = session
            .customer_details
            .and_then(|details| details.email)
            .or(session.customer_email);

        Ok(PaidSession {
            session_id: session.id,
            customer_email,
            payment_status: session
                .payment_status
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Decode a Stripe response, turning non-2xx into a provider error
async fn read_response<T: DeserializeOwned>(response: Response) -> ShopResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ShopError::Network(e.to_string()))?;

    if !status.is_success() {
        error!("Stripe API error: status={}, body={}", status, body);

        if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
            return Err(ShopError::provider(PROVIDER, error_response.error.message));
        }

        return Err(ShopError::provider(
            PROVIDER,
            format!("HTTP {}: {}", status, body),
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        ShopError::Serialization(format!("Failed to parse Stripe response: {}", e))
    })
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeCheckoutSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    customer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}
