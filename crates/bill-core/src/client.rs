//! # Billing Client Trait
//!
//! Capability interface over the external billing provider. The HTTP
//! handlers only ever see `Arc<dyn BillingClient>`, so the real Stripe
//! client and in-memory test fakes are interchangeable.

use crate::error::BillingResult;
use crate::types::{Customer, PaymentIntent, Price, Product, Subscription};
use async_trait::async_trait;
use std::sync::Arc;

/// Which lifecycle statuses a subscription listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusSelector {
    /// Every status, canceled and incomplete included
    #[default]
    All,
    /// Only currently active subscriptions
    Active,
}

impl StatusSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusSelector::All => "all",
            StatusSelector::Active => "active",
        }
    }
}

/// Filter for subscription listings
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    /// Restrict to one customer's subscriptions
    pub customer: Option<String>,
    pub status: StatusSelector,
    /// Page size; the façade never paginates past the first page
    pub limit: u8,
}

impl SubscriptionFilter {
    /// All statuses for one customer, first 10. This is the shape every
    /// lifecycle endpoint uses to inspect a customer's history.
    pub fn for_customer(customer_id: impl Into<String>) -> Self {
        Self {
            customer: Some(customer_id.into()),
            status: StatusSelector::All,
            limit: 10,
        }
    }

    /// Active subscriptions across all customers, first 10
    /// (administrative view).
    pub fn active() -> Self {
        Self {
            customer: None,
            status: StatusSelector::Active,
            limit: 10,
        }
    }
}

/// Parameters for creating a subscription
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub customer: String,
    pub price: String,
    /// 0 means no trial
    pub trial_period_days: i64,
}

/// Operations the façade needs from the billing provider.
///
/// Each method is a single provider API call; no method retries or
/// caches. Implementations: `StripeClient` (bill-stripe), plus test
/// fakes in bill-api.
#[async_trait]
pub trait BillingClient: Send + Sync {
    /// List catalog products (first page)
    async fn list_products(&self) -> BillingResult<Vec<Product>>;

    /// List catalog prices (first page)
    async fn list_prices(&self) -> BillingResult<Vec<Price>>;

    /// List customers matching an email. The provider does not enforce
    /// email uniqueness; callers take the first match.
    async fn list_customers(&self, email: &str) -> BillingResult<Vec<Customer>>;

    /// Create a customer keyed by email
    async fn create_customer(&self, email: &str) -> BillingResult<Customer>;

    /// List subscriptions matching a filter
    async fn list_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> BillingResult<Vec<Subscription>>;

    /// Create a subscription with incomplete-by-default payment
    /// behavior, expanding the latest invoice's payment intent so the
    /// caller gets a client secret to finish the payment with.
    async fn create_subscription(&self, req: &NewSubscription) -> BillingResult<Subscription>;

    /// Set or clear `cancel_at_period_end` on a subscription
    async fn update_subscription(
        &self,
        subscription_id: &str,
        cancel_at_period_end: bool,
    ) -> BillingResult<Subscription>;

    /// Terminate a subscription immediately; any trial is forfeited
    async fn cancel_subscription(&self, subscription_id: &str) -> BillingResult<Subscription>;

    /// Create a card-only payment intent for a one-off charge
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> BillingResult<PaymentIntent>;
}

/// Shared handle to a billing client (dynamic dispatch)
pub type SharedBillingClient = Arc<dyn BillingClient>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_for_customer() {
        let filter = SubscriptionFilter::for_customer("cus_1");
        assert_eq!(filter.customer.as_deref(), Some("cus_1"));
        assert_eq!(filter.status, StatusSelector::All);
        assert_eq!(filter.limit, 10);
    }

    #[test]
    fn test_active_filter() {
        let filter = SubscriptionFilter::active();
        assert!(filter.customer.is_none());
        assert_eq!(filter.status.as_str(), "active");
    }
}
