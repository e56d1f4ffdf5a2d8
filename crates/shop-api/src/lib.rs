//! # shop-api
//!
//! HTTP API layer for course-store-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Catalog and checkout endpoints
//! - Download-link delivery and redemption
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/items` | List items, flagging purchased ones |
//! | POST | `/create-checkout-session` | Create checkout session |
//! | GET | `/purchase-success` | Stripe success redirect |
//! | POST | `/download-email` | Email a link for one item |
//! | POST | `/download-all` | Email links for all purchases |
//! | GET | `/download/{code}` | Redeem a download code |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
