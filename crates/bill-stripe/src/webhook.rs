//! # Stripe Webhook Handling
//!
//! Signature verification and typed dispatch for inbound Stripe events.
//! Verification is computed over the exact request bytes, so the HTTP
//! layer must hand the raw body through unparsed.

use bill_core::{BillingError, BillingResult, Invoice, Subscription};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Maximum accepted age of a signed payload, in seconds
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Subscription and invoice events the façade dispatches on.
///
/// Closed enum rather than an open string switch so a new handled event
/// has to show up in every match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    TrialWillEnd,
    InvoiceCreated,
    InvoicePaid,
    InvoicePaymentFailed,
    /// Anything else the provider is configured to send
    Unknown(String),
}

impl EventType {
    /// Map the provider's event-type tag
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "customer.subscription.created" => EventType::SubscriptionCreated,
            "customer.subscription.updated" => EventType::SubscriptionUpdated,
            "customer.subscription.deleted" => EventType::SubscriptionDeleted,
            "customer.subscription.trial_will_end" => EventType::TrialWillEnd,
            "invoice.created" => EventType::InvoiceCreated,
            "invoice.paid" => EventType::InvoicePaid,
            "invoice.payment_failed" => EventType::InvoicePaymentFailed,
            other => EventType::Unknown(other.to_string()),
        }
    }
}

/// A verified, parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: EventType,
    /// Unix seconds when the provider created the event
    pub created: i64,
    /// The resource the event describes (`data.object`)
    pub object: serde_json::Map<String, serde_json::Value>,
    /// Fields the update changed, for `*.updated` events
    pub previous_attributes: Option<serde_json::Value>,
}

impl WebhookEvent {
    /// Deserialize `data.object` as a subscription
    pub fn subscription(&self) -> BillingResult<Subscription> {
        serde_json::from_value(serde_json::Value::Object(self.object.clone())).map_err(|e| {
            BillingError::WebhookParse(format!("Event object is not a subscription: {}", e))
        })
    }

    /// Deserialize `data.object` as an invoice
    pub fn invoice(&self) -> BillingResult<Invoice> {
        serde_json::from_value(serde_json::Value::Object(self.object.clone()))
            .map_err(|e| BillingError::WebhookParse(format!("Event object is not an invoice: {}", e)))
    }
}

/// Verifies webhook signatures against the shared signing secret
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify the `stripe-signature` header against the payload and
    /// parse the event.
    ///
    /// Rejects payloads whose signed timestamp is more than five
    /// minutes from now, then HMAC-SHA256s `"{timestamp}.{payload}"`
    /// and compares in constant time against every `v1` candidate.
    pub fn verify(&self, payload: &[u8], signature: &str) -> BillingResult<WebhookEvent> {
        let sig_parts = parse_signature_header(signature)?;

        let now = chrono::Utc::now().timestamp();
        if (now - sig_parts.timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(BillingError::WebhookVerification(
                "Timestamp outside tolerance".to_string(),
            ));
        }

        let signed_payload = format!(
            "{}.{}",
            sig_parts.timestamp,
            String::from_utf8_lossy(payload)
        );
        let expected_sig = compute_hmac_sha256(&self.secret, &signed_payload);

        let valid = sig_parts
            .signatures
            .iter()
            .any(|sig| constant_time_compare(sig, &expected_sig));

        if !valid {
            return Err(BillingError::WebhookVerification(
                "Signature mismatch".to_string(),
            ));
        }

        let raw: RawEvent = serde_json::from_slice(payload).map_err(|e| {
            BillingError::WebhookParse(format!("Failed to parse webhook: {}", e))
        })?;

        debug!("Verified Stripe webhook: type={}", raw.event_type);

        Ok(WebhookEvent {
            id: raw.id,
            event_type: EventType::from_tag(&raw.event_type),
            created: raw.created,
            object: raw.data.object,
            previous_attributes: raw.data.previous_attributes,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    previous_attributes: Option<serde_json::Value>,
}

// =============================================================================
// Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> BillingResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let kv: Vec<&str> = part.split('=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => {
                timestamp = kv[1].parse().ok();
            }
            "v1" => {
                signatures.push(kv[1].to_string());
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        BillingError::WebhookVerification("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(BillingError::WebhookVerification(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

// =============================================================================
// Event Dispatch
// =============================================================================

/// Webhook event handler trait.
///
/// Default implementations only log; a downstream consumer that needs
/// to propagate state changes (entitlement records, notifications)
/// overrides the relevant methods.
#[allow(unused_variables)]
pub trait EventHandler: Send + Sync {
    /// A new subscription exists on the provider side
    fn on_subscription_created(&self, subscription: &Subscription) -> BillingResult<()> {
        info!("Subscription created: {}", subscription.id);
        Ok(())
    }

    /// Plan change, cancellation scheduling, or other update
    fn on_subscription_updated(
        &self,
        subscription: &Subscription,
        previous_attributes: Option<&serde_json::Value>,
    ) -> BillingResult<()> {
        let reason = subscription
            .cancellation_details
            .as_ref()
            .and_then(|d| d.reason.as_deref());

        info!(
            subscription = %subscription.id,
            customer = subscription.customer_id(),
            status = %subscription.status,
            cancel_at_period_end = subscription.cancel_at_period_end,
            reason = ?reason,
            created = %format_timestamp_fr(Some(subscription.created)).unwrap_or_default(),
            canceled_at = ?format_timestamp_fr(subscription.canceled_at),
            cancel_at = ?format_timestamp_fr(subscription.cancel_at),
            previous_attributes = ?previous_attributes,
            "Subscription updated"
        );

        if subscription.cancel_at_period_end {
            info!(
                "Subscription {} will be canceled at period end",
                subscription.id
            );
        }
        Ok(())
    }

    /// The subscription ended (immediate cancel or lapsed period)
    fn on_subscription_deleted(&self, subscription: &Subscription) -> BillingResult<()> {
        info!("Subscription ended: {}", subscription.id);
        Ok(())
    }

    /// Trial expires in a few days
    fn on_trial_will_end(&self, subscription: &Subscription) -> BillingResult<()> {
        info!("Trial ending soon for subscription {}", subscription.id);
        Ok(())
    }

    /// An invoice was drafted for a subscription cycle
    fn on_invoice_created(&self, invoice: &Invoice) -> BillingResult<()> {
        if let Some(sub_id) = invoice_subscription_id(invoice) {
            info!("Invoice {} created for subscription {}", invoice.id, sub_id);
        }
        Ok(())
    }

    /// Invoice payment went through
    fn on_invoice_paid(&self, invoice: &Invoice) -> BillingResult<()> {
        if let Some(sub_id) = invoice_subscription_id(invoice) {
            info!(
                "Payment succeeded for invoice {} of subscription {}",
                invoice.id, sub_id
            );
        }
        Ok(())
    }

    /// Invoice payment failed; the provider will retry per its schedule
    fn on_invoice_payment_failed(&self, invoice: &Invoice) -> BillingResult<()> {
        if let Some(sub_id) = invoice_subscription_id(invoice) {
            warn!(
                "Payment failed for invoice {} of subscription {}",
                invoice.id, sub_id
            );
        }
        Ok(())
    }

    /// Anything not in the closed set above
    fn on_unknown(&self, event: &WebhookEvent) -> BillingResult<()> {
        debug!("Unhandled webhook event: {:?}", event.event_type);
        Ok(())
    }
}

/// Default handler: observes and logs, no side effects
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {}

/// Dispatch a verified event to the matching handler method
pub fn dispatch_event(handler: &dyn EventHandler, event: &WebhookEvent) -> BillingResult<()> {
    match &event.event_type {
        EventType::SubscriptionCreated => handler.on_subscription_created(&event.subscription()?),
        EventType::SubscriptionUpdated => handler.on_subscription_updated(
            &event.subscription()?,
            event.previous_attributes.as_ref(),
        ),
        EventType::SubscriptionDeleted => handler.on_subscription_deleted(&event.subscription()?),
        EventType::TrialWillEnd => handler.on_trial_will_end(&event.subscription()?),
        EventType::InvoiceCreated => handler.on_invoice_created(&event.invoice()?),
        EventType::InvoicePaid => handler.on_invoice_paid(&event.invoice()?),
        EventType::InvoicePaymentFailed => handler.on_invoice_payment_failed(&event.invoice()?),
        EventType::Unknown(_) => handler.on_unknown(event),
    }
}

fn invoice_subscription_id(invoice: &Invoice) -> Option<String> {
    invoice.subscription.as_ref().map(|sub| match sub {
        bill_core::Expandable::Id(id) => id.clone(),
        bill_core::Expandable::Object(s) => s.id.clone(),
    })
}

/// Unix seconds rendered in the fr-FR display locale (dd/mm/yyyy
/// hh:mm:ss), matching the dashboard the operators read.
fn format_timestamp_fr(ts: Option<i64>) -> Option<String> {
    ts.and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%d/%m/%Y %H:%M:%S").to_string())
}
