//! # bill-api
//!
//! HTTP layer for featherbill-rs: two independent axum services.
//!
//! - **bill-api** — REST façade over the billing provider (catalog,
//!   subscription lifecycle, one-off payment intents)
//! - **bill-webhook** — receiver for signed provider events
//!
//! ## Endpoints
//!
//! | Service | Method | Path | Description |
//! |---------|--------|------|-------------|
//! | api | GET | `/` | Liveness message |
//! | api | GET | `/products` | Products joined with prices |
//! | api | GET | `/subscriptions` | Active subscriptions |
//! | api | POST | `/create-payment-intent` | One-off card payment |
//! | api | POST | `/create-subscription` | Create subscription |
//! | api | POST | `/cancel-subscription` | Cancel now or at period end |
//! | api | POST | `/restore-subscription` | Undo pending cancellation |
//! | webhook | POST | `/webhook` | Signed provider events |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod webhook;

pub use routes::{create_api_router, create_webhook_router};
pub use state::{AppConfig, AppState, WebhookState};
