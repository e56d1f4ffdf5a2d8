//! # Course Store RS
//!
//! Digital-goods storefront backend.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export BREVO_API_KEY=xkeysib-...
//! export MAIL_SENDER_EMAIL=store@example.com
//! export SERVER_URL=http://localhost:3000
//! export CLIENT_URL=http://localhost:5173
//!
//! # Run the server
//! course-store
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Items loaded: {}", state.catalog().len());
    info!("Payment provider: {}", state.payments.provider_name());
    info!(
        "Download links expire after {}s, swept every {}s",
        state.links().ttl().as_secs(),
        state.config.sweep_interval.as_secs()
    );

    let _sweeper = state.links().spawn_sweeper(state.config.sweep_interval);

    let app = routes::create_router(state);

    info!("🚀 Course store starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("📚 Items: GET http://{}/items", addr);
        info!("💳 Checkout: POST http://{}/create-checkout-session", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `LOG_FORMAT=json` switches to structured output; `RUST_LOG` sets the filter
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn print_banner() {
    println!(
        r#"
  📚 Course Store RS 📚
  ━━━━━━━━━━━━━━━━━━━━━━━
  Digital downloads, single-use links
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
