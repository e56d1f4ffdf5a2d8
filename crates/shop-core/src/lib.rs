//! # shop-core
//!
//! Core types and services for the course-store digital storefront.
//!
//! This crate provides:
//! - `Catalog` and `Item` for the static list of purchasable items
//! - `DownloadLinkRegistry` for single-use, expiring download codes
//! - `PaymentStrategy`, `ContactDirectory` and `Mailer` provider traits
//! - `Fulfillment` for the purchase-to-delivery flow
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{Catalog, DownloadLinkRegistry, Fulfillment};
//!
//! let catalog = Arc::new(Catalog::load(&["config/items.toml"])?);
//! let links = DownloadLinkRegistry::default();
//! let _sweeper = links.spawn_sweeper(Duration::from_secs(60));
//!
//! let fulfillment = Fulfillment::new(catalog, links, contacts, mailer, "https://api.example.com");
//!
//! // After the payment provider confirms the purchase
//! fulfillment.record_purchase("buyer@example.com", 3).await?;
//! ```

pub mod catalog;
pub mod error;
pub mod fulfillment;
pub mod links;
pub mod mail;
pub mod provider;

// Re-exports for convenience
pub use catalog::{Catalog, Currency, Item};
pub use error::{ShopError, ShopResult};
pub use fulfillment::Fulfillment;
pub use links::{DownloadCode, DownloadLinkRegistry, DEFAULT_LINK_TTL};
pub use mail::EmailMessage;
pub use provider::{
    BoxedContactDirectory, BoxedMailer, BoxedPaymentStrategy, CheckoutRequest, CheckoutSession,
    Contact, ContactDirectory, Mailer, PaidSession, PaymentStrategy,
};
