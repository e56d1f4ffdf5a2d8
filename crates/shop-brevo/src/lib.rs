//! # shop-brevo
//!
//! Brevo (formerly Sendinblue) integration for course-store-rs.
//!
//! `BrevoClient` implements both provider seams that live on Brevo:
//! - `ContactDirectory`: contacts tagged by list membership, one list per item
//! - `Mailer`: transactional email via `/smtp/email`
//!
//! ```rust,ignore
//! use shop_brevo::BrevoClient;
//!
//! let brevo = Arc::new(BrevoClient::from_env()?);
//! let fulfillment = Fulfillment::new(catalog, links, brevo.clone(), brevo, server_url);
//! ```

pub mod client;
pub mod config;

pub use client::BrevoClient;
pub use config::{BrevoConfig, Sender};
