//! # Webhook Receiver
//!
//! Handler for the standalone webhook service. The body must arrive
//! unparsed: signature verification runs over the exact bytes Stripe
//! sent, so no JSON middleware may touch the request first.

use crate::handlers::ErrorBody;
use crate::state::WebhookState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use bill_stripe::dispatch_event;
use tracing::{error, info, instrument, warn};

/// Receive, verify and dispatch one provider event.
///
/// Once the signature verifies this always answers 200: the provider's
/// redelivery machinery keys on the status code, and a handler hiccup
/// must not trigger a redelivery storm. Only authentication failures
/// get a 400.
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Webhook rejected: missing stripe-signature header");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "Missing stripe-signature header".to_string(),
                }),
            )
        })?;

    let event = state.verifier.verify(&body, signature).map_err(|e| {
        warn!("Webhook rejected: {}", e);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: e.to_string(),
            }),
        )
    })?;

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.id
    );

    if let Err(e) = dispatch_event(&*state.handler, &event) {
        error!("Webhook handler error for {}: {}", event.id, e);
    }

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bill_core::{BillingResult, Subscription};
    use bill_stripe::EventHandler;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SECRET: &str = "whsec_test";

    fn signed_headers(payload: &[u8], secret: &str) -> HeaderMap {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let timestamp = chrono::Utc::now().timestamp();
        let signed = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(
            "stripe-signature",
            format!("t={},v1={}", timestamp, signature).parse().unwrap(),
        );
        headers
    }

    fn subscription_event() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "customer.subscription.deleted",
            "created": 1700000000,
            "data": {
                "object": {
                    "id": "sub_1",
                    "customer": "cus_1",
                    "status": "canceled",
                    "created": 1700000000
                }
            }
        }))
        .unwrap()
    }

    #[derive(Default)]
    struct CountingHandler {
        deleted: AtomicUsize,
    }

    impl EventHandler for CountingHandler {
        fn on_subscription_deleted(&self, _subscription: &Subscription) -> BillingResult<()> {
            self.deleted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_valid_event_is_dispatched() {
        let handler = Arc::new(CountingHandler::default());
        let state = WebhookState::new(SECRET).with_handler(handler.clone());
        let payload = subscription_event();
        let headers = signed_headers(&payload, SECRET);

        let status = stripe_webhook(State(state), headers, Bytes::from(payload))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(handler.deleted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bad_signature_skips_dispatch() {
        let handler = Arc::new(CountingHandler::default());
        let state = WebhookState::new(SECRET).with_handler(handler.clone());
        let payload = subscription_event();
        let headers = signed_headers(&payload, "whsec_wrong");

        let (status, _) = stripe_webhook(State(state), headers, Bytes::from(payload))
            .await
            .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(handler.deleted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_header_is_400() {
        let state = WebhookState::new(SECRET);

        let (status, body) = stripe_webhook(
            State(state),
            HeaderMap::new(),
            Bytes::from(subscription_event()),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.error, "Missing stripe-signature header");
    }

    #[tokio::test]
    async fn test_handler_failure_still_200() {
        struct FailingHandler;

        impl EventHandler for FailingHandler {
            fn on_subscription_deleted(&self, _subscription: &Subscription) -> BillingResult<()> {
                Err(bill_core::BillingError::WebhookParse("boom".into()))
            }
        }

        let state = WebhookState::new(SECRET).with_handler(Arc::new(FailingHandler));
        let payload = subscription_event();
        let headers = signed_headers(&payload, SECRET);

        let status = stripe_webhook(State(state), headers, Bytes::from(payload))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
    }
}
