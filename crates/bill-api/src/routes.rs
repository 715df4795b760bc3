//! # Routes
//!
//! Router construction for the two services. The API router carries
//! permissive CORS; the webhook router deliberately has none and leaves
//! the body extractor raw.

use crate::state::{AppState, WebhookState};
use crate::{handlers, webhook};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Router of the billing API service
///
/// Routes:
/// - GET  /                        - liveness message
/// - GET  /products                - catalog with default prices
/// - GET  /subscriptions           - active subscriptions (admin view)
/// - POST /create-payment-intent   - one-off card payment
/// - POST /create-subscription     - subscription creation
/// - POST /cancel-subscription     - immediate or period-end cancel
/// - POST /restore-subscription    - undo a pending cancellation
pub fn create_api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/products", get(handlers::list_products))
        .route("/subscriptions", get(handlers::list_subscriptions))
        .route(
            "/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .route("/create-subscription", post(handlers::create_subscription))
        .route("/cancel-subscription", post(handlers::cancel_subscription))
        .route(
            "/restore-subscription",
            post(handlers::restore_subscription),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router of the webhook service. No CORS: only the provider calls it.
pub fn create_webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::stripe_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
