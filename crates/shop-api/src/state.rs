//! # Application State
//!
//! Shared state for the Axum application.
//! Holds configuration, the catalog, the payment strategy and the
//! fulfillment service (which owns the download-link registry).

use anyhow::Context;
use shop_brevo::BrevoClient;
use shop_core::{
    BoxedContactDirectory, BoxedMailer, BoxedPaymentStrategy, Catalog, DownloadLinkRegistry,
    Fulfillment,
};
use shop_stripe::StripeCheckoutStrategy;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this server (download links, payment callback)
    pub server_url: String,
    /// Storefront origin (CORS, cancel and confirmation pages)
    pub client_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Root of the static assets; deliverables live under `downloads/`
    pub public_dir: PathBuf,
    /// Explicit catalog file, overriding the default lookup paths
    pub catalog_path: Option<PathBuf>,
    /// Lifetime of a download code
    pub link_ttl: Duration,
    /// How often expired codes are swept
    pub sweep_interval: Duration,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let link_ttl_secs: u64 = env_or("DOWNLOAD_LINK_TTL_SECS", 600)?;
        let sweep_secs: u64 = env_or("LINK_SWEEP_INTERVAL_SECS", 60)?;
        anyhow::ensure!(link_ttl_secs > 0, "DOWNLOAD_LINK_TTL_SECS must be positive");
        anyhow::ensure!(sweep_secs > 0, "LINK_SWEEP_INTERVAL_SECS must be positive");

        Ok(Self {
            host: env_or("HOST", "127.0.0.1".to_string())?,
            port: env_or("PORT", 3000)?,
            server_url: trim_url(env_or("SERVER_URL", "http://localhost:3000".to_string())?),
            client_url: trim_url(env_or("CLIENT_URL", "http://localhost:5173".to_string())?),
            environment: env_or("ENVIRONMENT", "development".to_string())?,
            public_dir: env_or("PUBLIC_DIR", PathBuf::from("public"))?,
            catalog_path: std::env::var("CATALOG_PATH").ok().map(PathBuf::from),
            link_ttl: Duration::from_secs(link_ttl_secs),
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Where the payment provider sends the customer after paying for `item_id`
    pub fn success_url(&self, item_id: u32) -> String {
        format!(
            "{}/purchase-success?itemId={}&sessionId={{CHECKOUT_SESSION_ID}}",
            self.server_url, item_id
        )
    }

    /// Where the payment provider sends the customer on cancel
    pub fn cancel_url(&self) -> String {
        self.client_url.clone()
    }

    /// Client page shown once a purchase has been confirmed
    pub fn confirmation_url(&self) -> String {
        format!("{}/download-links.html", self.client_url)
    }

    fn catalog_paths(&self) -> Vec<PathBuf> {
        match &self.catalog_path {
            Some(path) => vec![path.clone()],
            None => vec![
                PathBuf::from("config/items.toml"),
                PathBuf::from("../config/items.toml"),
                PathBuf::from("../../config/items.toml"),
            ],
        }
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        Err(_) => Ok(default),
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: Arc<AppConfig>,
    /// Hosted-checkout payment provider
    pub payments: BoxedPaymentStrategy,
    /// Purchase-to-delivery flow, including the download-link registry
    pub fulfillment: Fulfillment,
}

impl AppState {
    /// Build the production state: Stripe for payments, Brevo for contacts and mail
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let catalog = Catalog::load(&config.catalog_paths())?;

        let stripe = StripeCheckoutStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
        let brevo = Arc::new(
            BrevoClient::from_env()
                .map_err(|e| anyhow::anyhow!("Failed to initialize Brevo: {}", e))?,
        );

        Ok(Self::from_parts(
            config,
            catalog,
            Arc::new(stripe),
            brevo.clone(),
            brevo,
        ))
    }

    /// Assemble state from explicit collaborators
    pub fn from_parts(
        config: AppConfig,
        catalog: Catalog,
        payments: BoxedPaymentStrategy,
        contacts: BoxedContactDirectory,
        mailer: BoxedMailer,
    ) -> Self {
        let links = DownloadLinkRegistry::new(config.link_ttl);
        let fulfillment = Fulfillment::new(
            Arc::new(catalog),
            links,
            contacts,
            mailer,
            config.server_url.clone(),
        );

        Self {
            config: Arc::new(config),
            payments,
            fulfillment,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.fulfillment.catalog()
    }

    pub fn links(&self) -> &DownloadLinkRegistry {
        self.fulfillment.links()
    }
}
