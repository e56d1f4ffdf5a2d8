//! # shop-stripe
//!
//! Stripe payment strategy for course-store-rs.
//!
//! **StripeCheckoutStrategy** talks to the Checkout Sessions API:
//! - opens a hosted checkout page for a single catalog item
//! - retrieves a completed session to learn the verified purchaser email
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_stripe::StripeCheckoutStrategy;
//! use shop_core::{CheckoutRequest, PaymentStrategy};
//!
//! let strategy = StripeCheckoutStrategy::from_env()?;
//!
//! let session = strategy.create_checkout(&request).await?;
//! // Hand session.session_id to the browser for redirectToCheckout
//!
//! // Later, on the success callback:
//! let paid = strategy.retrieve_session(&session_id).await?;
//! ```

pub mod checkout;
pub mod config;

// Re-exports
pub use checkout::StripeCheckoutStrategy;
pub use config::StripeConfig;
