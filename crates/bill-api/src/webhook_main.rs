//! # Webhook Receiver Service
//!
//! Standalone receiver for signed Stripe events, on its own port so the
//! API service's JSON middleware never touches the raw payloads.
//!
//! For local testing, forward events with the Stripe CLI:
//!
//! ```bash
//! stripe listen --forward-to localhost:5002/webhook
//! # Copy the whsec_... it prints into STRIPE_WEBHOOK_SECRET
//! ```

use bill_api::{create_webhook_router, AppConfig, WebhookState};
use bill_stripe::{StripeConfig, REQUIRED_WEBHOOK_EVENTS};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = AppConfig::from_env();
    let stripe_config = StripeConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load Stripe config: {}", e))?;

    let state = WebhookState::new(stripe_config.webhook_secret);
    let addr = config.webhook_socket_addr();

    info!("Environment: {}", config.environment);
    info!("Webhook receiver starting on http://{}", addr);
    info!(
        "Expecting events (enable in the Stripe Dashboard): {}",
        REQUIRED_WEBHOOK_EVENTS.join(", ")
    );

    let app = create_webhook_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
