//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//! Identity is a plain `email` cookie set after payment confirmation or a
//! link-recovery request.

use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use shop_core::{CheckoutRequest, Item, ShopError};
use tracing::{error, info, instrument, warn};

/// Name of the identity cookie
pub const EMAIL_COOKIE: &str = "email";

const EMAIL_COOKIE_MAX_AGE: time::Duration = time::Duration::days(30);

const EXPIRED_LINK_MESSAGE: &str = "This link has either expired or is invalid";
const MISSING_ITEM_MESSAGE: &str = "This item could not be found";
const RETRY_MESSAGE: &str = "Error: Please try again";

// =============================================================================
// Request/Response Types
// =============================================================================

/// `{ "message": ... }` body used by every JSON endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ApiError = (StatusCode, Json<MessageResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(MessageResponse::new(message)))
}

/// Provider failures keep their status but not their upstream message
fn shop_error_to_response(err: &ShopError) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if err.is_external() {
        return api_error(status, RETRY_MESSAGE);
    }
    api_error(status, err.to_string())
}

/// Item id as sent by the storefront: a JSON number or a numeric string.
///
/// Any JSON value deserializes; ids that are not a valid `u32` parse to `None`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemIdParam {
    Number(serde_json::Number),
    Text(String),
    Other(serde_json::Value),
}

impl ItemIdParam {
    pub fn parse(&self) -> Option<u32> {
        match self {
            ItemIdParam::Number(id) => id.as_u64().and_then(|id| u32::try_from(id).ok()),
            ItemIdParam::Text(text) => text.trim().parse().ok(),
            ItemIdParam::Other(_) => None,
        }
    }
}

/// Body of `/create-checkout-session` and `/download-email`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    #[serde(default)]
    pub item_id: Option<ItemIdParam>,
}

impl ItemRequest {
    fn item_id(&self) -> Option<u32> {
        self.item_id.as_ref().and_then(ItemIdParam::parse)
    }
}

/// Body of `/download-all`
#[derive(Debug, Deserialize)]
pub struct DownloadAllRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Query of `/purchase-success`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSuccessQuery {
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Catalog entry as listed to the storefront
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemView {
    pub id: u32,
    pub name: String,
    pub price: f64,
    pub purchased: bool,
}

/// Checkout session id for the client-side redirect
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub id: String,
}

// =============================================================================
// Cookies
// =============================================================================

fn email_cookie(email: String) -> Cookie<'static> {
    Cookie::build((EMAIL_COOKIE, email))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(EMAIL_COOKIE_MAX_AGE)
        .build()
}

fn cookie_email(jar: &CookieJar) -> Option<String> {
    jar.get(EMAIL_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|email| !email.is_empty())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "course-store",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List the catalog, flagging items the cookie's email already owns
#[instrument(skip(state, jar))]
pub async fn list_items(State(state): State<AppState>, jar: CookieJar) -> Json<Vec<ItemView>> {
    let email = cookie_email(&jar).unwrap_or_default();

    let purchased: Vec<u32> = match state.fulfillment.purchased_items(&email).await {
        Ok(items) => items.iter().map(|item| item.id).collect(),
        Err(e) => {
            warn!("Could not load purchases, listing none as owned: {}", e);
            Vec::new()
        }
    };

    let catalog = state.catalog();
    let items = catalog
        .items()
        .map(|item| ItemView {
            id: item.id,
            name: item.name.clone(),
            price: item.price_decimal(catalog.currency),
            purchased: purchased.contains(&item.id),
        })
        .collect();

    Json(items)
}

/// Open a hosted checkout session for one item
#[instrument(skip(state, request))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(request): Json<ItemRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let item = find_item(&state, request.item_id())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Invalid Item"))?;

    let checkout = CheckoutRequest::for_item(
        item,
        state.catalog().currency,
        state.config.success_url(item.id),
        state.config.cancel_url(),
    );

    let session = state
        .payments
        .create_checkout(&checkout)
        .await
        .map_err(|e| {
            error!("Failed to create checkout: {}", e);
            shop_error_to_response(&e)
        })?;

    info!(
        "Created {} checkout session {} for item {}",
        state.payments.provider_name(),
        session.session_id,
        item.id
    );

    Ok(Json(CheckoutResponse {
        id: session.session_id,
    }))
}

/// Payment provider success callback.
///
/// The purchaser email is taken from the provider's record of the session,
/// never from the request.
#[instrument(skip(state, query, jar))]
pub async fn purchase_success(
    State(state): State<AppState>,
    Query(query): Query<PurchaseSuccessQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let item_id = query.item_id.as_deref().and_then(|id| id.trim().parse().ok());
    let item = find_item(&state, item_id)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Invalid Item"))?;

    let session_id = query
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing sessionId"))?;

    let session = state
        .payments
        .retrieve_session(&session_id)
        .await
        .map_err(|e| {
            error!("Failed to retrieve checkout session {}: {}", session_id, e);
            shop_error_to_response(&e)
        })?;

    if !session.is_paid() {
        warn!(
            "Checkout session {} is not paid (status={})",
            session.session_id, session.payment_status
        );
        return Ok((jar, Redirect::to(&state.config.cancel_url())));
    }

    let confirmation = Redirect::to(&state.config.confirmation_url());

    let Some(email) = session.customer_email.filter(|email| !email.trim().is_empty()) else {
        error!("Checkout session {} has no customer email", session.session_id);
        return Ok((jar, confirmation));
    };

    info!("Payment confirmed for item {}", item.id);
    let jar = jar.add(email_cookie(email.clone()));
    state.fulfillment.spawn_record_purchase(email, item.id);

    Ok((jar, confirmation))
}

/// Email a fresh download link for one item to the cookie's email
#[instrument(skip(state, jar, request))]
pub async fn download_email(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<ItemRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let item_id = request
        .item_id()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Item not found"))?;
    let email = cookie_email(&jar).unwrap_or_default();

    match state.fulfillment.fulfill_single(&email, item_id).await {
        Ok(_) => Ok(Json(MessageResponse::new("Check your email"))),
        Err(e) if e.is_not_found() => Err(api_error(StatusCode::NOT_FOUND, "Item not found")),
        Err(e) => {
            warn!("Download email for item {} failed: {}", item_id, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, RETRY_MESSAGE))
        }
    }
}

/// Re-send links for everything an email owns.
///
/// Reachable without a cookie on purpose: this is how lost links are recovered.
/// The response never reveals whether anything was owned or sent.
#[instrument(skip(state, jar, request))]
pub async fn download_all(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<DownloadAllRequest>,
) -> (CookieJar, Json<MessageResponse>) {
    let email = request
        .email
        .map(|email| email.trim().to_string())
        .unwrap_or_default();

    let jar = if email.is_empty() {
        warn!("Link recovery requested without an email; cookie not set");
        jar
    } else {
        jar.add(email_cookie(email.clone()))
    };

    state.fulfillment.spawn_fulfill_all(email);

    (
        jar,
        Json(MessageResponse::new("Check your email for a download link")),
    )
}

/// Redeem a download code and send the browser to the asset
#[instrument(skip(state, code))]
pub async fn download(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    let item_id = match state.links().redeem(&code) {
        Ok(item_id) => item_id,
        Err(_) => return EXPIRED_LINK_MESSAGE.into_response(),
    };

    match state.catalog().find_by_id(item_id) {
        Ok(item) => {
            info!("Download link redeemed for item {}", item.id);
            Redirect::to(&item.download_path()).into_response()
        }
        Err(_) => {
            error!("Redeemed code points at unknown item {}", item_id);
            MISSING_ITEM_MESSAGE.into_response()
        }
    }
}

fn find_item(state: &AppState, item_id: Option<u32>) -> Option<&Item> {
    item_id.and_then(|id| state.catalog().find_by_id(id).ok())
}
