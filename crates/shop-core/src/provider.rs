//! # Provider Traits
//!
//! Seams to the external services the store is glued to.
//!
//! ```text
//! ┌──────────────────────┐  ┌──────────────────────┐  ┌──────────────────────┐
//! │ PaymentStrategy      │  │ ContactDirectory     │  │ Mailer               │
//! │  ├── create_checkout │  │  ├── find_contact    │  │  └── send            │
//! │  └── retrieve_session│  │  ├── create_contact  │  │                      │
//! │                      │  │  └── add_to_list     │  │                      │
//! └──────────▲───────────┘  └──────────▲───────────┘  └──────────▲───────────┘
//!            │                         └────────────┬────────────┘
//!  ┌─────────┴──────────┐               ┌───────────┴──────────┐
//!  │StripeCheckout      │               │ BrevoClient          │
//!  │   Strategy         │               │                      │
//!  └────────────────────┘               └──────────────────────┘
//! ```

use crate::catalog::{Currency, Item};
use crate::error::ShopResult;
use crate::mail::EmailMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything a payment provider needs to open a hosted checkout for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub item_id: u32,
    pub name: String,
    /// Amount in smallest currency unit
    pub unit_amount: u64,
    pub currency: Currency,
    pub quantity: u32,
    /// URL the provider redirects to after payment
    pub success_url: String,
    /// URL the provider redirects to if the customer backs out
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Single-unit checkout for a catalog item
    pub fn for_item(
        item: &Item,
        currency: Currency,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            unit_amount: item.price_in_cents,
            currency,
            quantity: 1,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }
}

/// A hosted checkout session opened by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID, handed to the browser for redirect
    pub session_id: String,

    /// Hosted checkout URL, if the provider returns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,

    /// Provider name (e.g., "stripe")
    pub provider: String,
}

/// A checkout session as seen after the customer returns from the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidSession {
    pub session_id: String,

    /// Email verified by the provider during checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Provider payment status ("paid", "unpaid", "no_payment_required")
    pub payment_status: String,
}

impl PaidSession {
    /// Check if the provider considers this session settled
    pub fn is_paid(&self) -> bool {
        matches!(self.payment_status.as_str(), "paid" | "no_payment_required")
    }
}

/// Hosted-checkout payment provider
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Open a checkout session and return its id.
    async fn create_checkout(&self, request: &CheckoutRequest) -> ShopResult<CheckoutSession>;

    /// Fetch a session server-side to learn who paid.
    async fn retrieve_session(&self, session_id: &str) -> ShopResult<PaidSession>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// A contact as recorded by the contact provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
    /// Lists the contact belongs to; each list marks ownership of one item
    #[serde(default)]
    pub list_ids: Vec<u64>,
}

/// Contact/list system holding the authoritative purchase record
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Look up a contact; an unknown email is `Ok(None)`.
    async fn find_contact(&self, email: &str) -> ShopResult<Option<Contact>>;

    /// Create a contact that already belongs to `list_id`.
    async fn create_contact(&self, email: &str, list_id: u64) -> ShopResult<()>;

    /// Add an existing contact to `list_id`.
    async fn add_to_list(&self, contact_id: u64, list_id: u64) -> ShopResult<()>;
}

/// Transactional email sender
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> ShopResult<()>;
}

pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;
pub type BoxedContactDirectory = Arc<dyn ContactDirectory>;
pub type BoxedMailer = Arc<dyn Mailer>;
