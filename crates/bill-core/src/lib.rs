//! # bill-core
//!
//! Core types and traits for the featherbill billing façade.
//!
//! This crate provides:
//! - `BillingClient` trait, the capability interface over the external
//!   billing provider
//! - Typed views over provider resources (`Product`, `Price`,
//!   `Customer`, `Subscription`, `PaymentIntent`)
//! - `BillingError` for typed error handling
//!
//! The façade holds no durable state of its own: every entity lives on
//! the provider side, and this crate only models what the HTTP layer
//! reads and writes.

pub mod client;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use client::{
    BillingClient, NewSubscription, SharedBillingClient, StatusSelector, SubscriptionFilter,
};
pub use error::{BillingError, BillingResult};
pub use types::{
    CancellationDetails, Customer, Expandable, Invoice, PaymentIntent, Price, Product,
    Subscription, SubscriptionStatus,
};
