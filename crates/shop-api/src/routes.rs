//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

/// Create the main application router
///
/// Routes:
/// - GET  /, /health               - Health check
/// - GET  /items                   - Catalog with per-caller `purchased` flags
/// - POST /create-checkout-session - Open a hosted checkout for one item
/// - GET  /purchase-success        - Payment provider success callback
/// - POST /download-email          - Email a link for one owned item
/// - POST /download-all            - Email links for everything an address owns
/// - GET  /download/{code}         - Redeem a single-use download code
/// - GET  /downloads/*             - Deliverable files
pub fn create_router(state: AppState) -> Router {
    // Credentialed CORS needs an explicit origin
    let origin = HeaderValue::from_str(&state.config.client_url).ok();
    if origin.is_none() {
        warn!(
            "CLIENT_URL {:?} is not a valid origin; cross-origin requests will be refused",
            state.config.client_url
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origin))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let downloads = ServeDir::new(state.config.public_dir.join("downloads"));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Catalog and checkout
        .route("/items", get(handlers::list_items))
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session),
        )
        .route("/purchase-success", get(handlers::purchase_success))
        // Link delivery
        .route("/download-email", post(handlers::download_email))
        .route("/download-all", post(handlers::download_all))
        .route("/download/{code}", get(handlers::download))
        .nest_service("/downloads", downloads)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
