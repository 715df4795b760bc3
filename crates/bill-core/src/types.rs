//! # Billing Domain Types
//!
//! Typed views over the billing provider's resources. Every entity here
//! is owned by the provider; this crate only deserializes the slices of
//! each resource the façade actually reads.

use serde::{Deserialize, Serialize};

/// A provider-side reference that may arrive either as a bare id or as
/// the expanded object, depending on whether the request asked for
/// expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Object(Box<T>),
    Id(String),
}

impl<T> Expandable<T> {
    /// The expanded object, if the provider returned one.
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Expandable::Object(obj) => Some(obj),
            Expandable::Id(_) => None,
        }
    }
}

/// Catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Price attached to a product, amount in minor currency units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    /// Owning product id
    pub product: String,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    pub currency: String,
}

/// Billing customer, looked up by email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Subscription lifecycle status, as defined by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    Canceled,
    Incomplete,
    IncompleteExpired,
    PastDue,
    Unpaid,
    Paused,
}

impl SubscriptionStatus {
    /// A subscription currently granting service: active or trialing.
    /// The duplicate-subscription guard and the cancel/restore lookups
    /// all key on this predicate.
    pub fn is_live(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }

    /// Provider's wire form of the status tag
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cancellation metadata the provider attaches to updated subscriptions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancellationDetails {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// A recurring billing relationship between a customer and a price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer: Expandable<Customer>,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Unix seconds; None once the trial is over or was never granted
    #[serde(default)]
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub canceled_at: Option<i64>,
    #[serde(default)]
    pub cancel_at: Option<i64>,
    /// Present when the creation request expanded it
    #[serde(default)]
    pub latest_invoice: Option<Expandable<Invoice>>,
    #[serde(default)]
    pub cancellation_details: Option<CancellationDetails>,
}

impl Subscription {
    /// Customer id regardless of expansion
    pub fn customer_id(&self) -> &str {
        match &self.customer {
            Expandable::Id(id) => id,
            Expandable::Object(c) => &c.id,
        }
    }

    /// Client secret of the latest invoice's payment intent, when both
    /// were expanded in the creating request.
    pub fn payment_client_secret(&self) -> Option<&str> {
        self.latest_invoice
            .as_ref()
            .and_then(|inv| inv.as_object())
            .and_then(|inv| inv.payment_intent.as_ref())
            .and_then(|pi| pi.as_object())
            .and_then(|pi| pi.client_secret.as_deref())
    }

    /// True when the subscription is live but flagged to lapse at the
    /// end of the current period.
    pub fn is_pending_cancellation(&self) -> bool {
        self.cancel_at_period_end && self.status.is_live()
    }
}

/// Invoice, referenced from subscriptions and webhook events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub subscription: Option<Expandable<Subscription>>,
    #[serde(default)]
    pub payment_intent: Option<Expandable<PaymentIntent>>,
}

/// One attempted payment, carrying the client-side completion secret
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}
