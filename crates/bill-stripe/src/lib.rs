//! # bill-stripe
//!
//! Stripe implementation of the featherbill billing capability.
//!
//! This crate provides:
//!
//! 1. **StripeClient** - `BillingClient` over the Stripe REST API
//!    (form-encoded requests, typed JSON responses, no retries)
//! 2. **WebhookVerifier** - signature verification over raw event
//!    payloads, plus typed event dispatch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bill_stripe::StripeClient;
//! use bill_core::{BillingClient, SubscriptionFilter};
//!
//! // Create client from environment
//! let client = StripeClient::from_env()?;
//!
//! // Look up a customer's subscription history
//! let subs = client
//!     .list_subscriptions(&SubscriptionFilter::for_customer("cus_123"))
//!     .await?;
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use bill_stripe::{WebhookVerifier, LoggingEventHandler, dispatch_event};
//!
//! // In your webhook endpoint:
//! let verifier = WebhookVerifier::new(webhook_secret);
//! let event = verifier.verify(payload, signature)?;
//! dispatch_event(&LoggingEventHandler, &event)?;
//! ```

pub mod client;
pub mod config;
pub mod webhook;

// Re-exports
pub use client::StripeClient;
pub use config::StripeConfig;
pub use webhook::{
    dispatch_event, EventHandler, EventType, LoggingEventHandler, WebhookEvent, WebhookVerifier,
};

/// Events the webhook endpoint expects to be enabled in the Stripe
/// Dashboard.
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] = &[
    "customer.subscription.created",
    "customer.subscription.updated",
    "customer.subscription.deleted",
    "customer.subscription.trial_will_end",
    "invoice.created",
    "invoice.paid",
    "invoice.payment_failed",
];
