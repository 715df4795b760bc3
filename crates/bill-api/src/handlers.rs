//! # Request Handlers
//!
//! Axum handlers for the billing API service. Every endpoint is a
//! stateless pass-through to the injected `BillingClient`: light
//! branching on subscription status, response reshaping, nothing held
//! locally. Client-visible messages are French; existing clients match
//! on the exact strings, so they must not be rephrased.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use bill_core::{
    BillingClient, BillingError, BillingResult, NewSubscription, Subscription,
    SubscriptionFilter, SubscriptionStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create subscription request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Trial length in days; absent means no trial
    #[serde(default)]
    pub trial_days: Option<i64>,
}

/// Cancel subscription request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    #[serde(default)]
    pub email: Option<String>,
    /// true terminates now; false/absent cancels at period end
    #[serde(default)]
    pub cancel_immediately: Option<bool>,
}

/// Restore subscription request
#[derive(Debug, Deserialize)]
pub struct RestoreSubscriptionRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// One-off payment intent request. Both fields are required: a body
/// missing either is rejected by the JSON extractor with a 422 and
/// never reaches the provider.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
}

/// Create subscription response. Key casing is uneven (camelCase ids,
/// snake_case trial_end); existing clients were built against this
/// exact shape.
#[derive(Debug, Serialize)]
pub struct CreateSubscriptionResponse {
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: Option<String>,
    pub trial_end: Option<i64>,
}

/// Cancel/restore response
#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub message: String,
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
    pub status: SubscriptionStatus,
}

/// Payment intent response
#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: Option<String>,
}

/// Product joined with its default price, major currency units
#[derive(Debug, Serialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "priceId")]
    pub price_id: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// Active subscriptions listing
#[derive(Debug, Serialize)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<Subscription>,
}

/// Error response body: the error message, verbatim
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error tuple every handler resolves to
pub type ApiError = (StatusCode, Json<ErrorBody>);

fn billing_error_to_response(err: BillingError) -> ApiError {
    if err.is_upstream() {
        error!("Billing provider error: {}", err);
    }
    let code = err.status_code();
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Liveness probe
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Le serveur perso stripe est actif"
    }))
}

/// List active catalog products joined with their default price
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRecord>>, ApiError> {
    list_products_inner(&*state.billing)
        .await
        .map(Json)
        .map_err(billing_error_to_response)
}

async fn list_products_inner(billing: &dyn BillingClient) -> BillingResult<Vec<ProductRecord>> {
    let products = billing.list_products().await?;
    let prices = billing.list_prices().await?;

    let records = products
        .into_iter()
        .filter(|product| product.active)
        .map(|product| {
            let price = prices.iter().find(|p| p.product == product.id);
            ProductRecord {
                id: product.id,
                name: product.name,
                description: product.description,
                price_id: price.map(|p| p.id.clone()),
                price: price.and_then(|p| p.unit_amount).map(|a| a as f64 / 100.0),
                currency: price.map(|p| p.currency.clone()),
            }
        })
        .collect();

    Ok(records)
}

/// Administrative view: first 10 active subscriptions across all
/// customers.
#[instrument(skip(state))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<SubscriptionsResponse>, (StatusCode, Json<serde_json::Value>)> {
    match state
        .billing
        .list_subscriptions(&SubscriptionFilter::active())
        .await
    {
        Ok(subscriptions) => {
            for sub in &subscriptions {
                info!(
                    "Subscription: id={}, customer={}, status={}",
                    sub.id,
                    sub.customer_id(),
                    sub.status
                );
            }
            Ok(Json(SubscriptionsResponse { subscriptions }))
        }
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": "Impossible de lister les abonnements.",
                "error": e.to_string()
            })),
        )),
    }
}

/// Create a card-only payment intent for a one-off charge. Repeated
/// calls create distinct intents; there is deliberately no idempotency
/// key.
#[instrument(skip(state, request), fields(amount = request.amount, currency = %request.currency))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let intent = state
        .billing
        .create_payment_intent(request.amount, &request.currency)
        .await
        .map_err(billing_error_to_response)?;

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// Create a subscription for an email, creating the customer lazily
#[instrument(skip(state, request))]
pub async fn create_subscription(
    State(state): State<AppState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<Json<CreateSubscriptionResponse>, ApiError> {
    create_subscription_inner(&*state.billing, request)
        .await
        .map(Json)
        .map_err(billing_error_to_response)
}

async fn create_subscription_inner(
    billing: &dyn BillingClient,
    request: CreateSubscriptionRequest,
) -> BillingResult<CreateSubscriptionResponse> {
    let (Some(price_id), Some(email)) = (
        request.price_id.filter(|s| !s.is_empty()),
        request.email.filter(|s| !s.is_empty()),
    ) else {
        return Err(BillingError::MissingField(
            "priceId et email sont requis".to_string(),
        ));
    };

    // First match wins; the provider does not enforce email uniqueness.
    let customer = match billing.list_customers(&email).await?.into_iter().next() {
        Some(existing) => existing,
        None => billing.create_customer(&email).await?,
    };

    // Check-then-act guard: two concurrent requests for the same email
    // can both pass and both create a subscription. Nothing on the
    // provider side serializes this; the window is a known property of
    // the service.
    let existing = billing
        .list_subscriptions(&SubscriptionFilter::for_customer(&customer.id))
        .await?;

    if existing.iter().any(|sub| sub.status.is_live()) {
        return Err(BillingError::Conflict(
            "L'utilisateur a déjà un abonnement actif ou en période d'essai.".to_string(),
        ));
    }

    let subscription = billing
        .create_subscription(&NewSubscription {
            customer: customer.id,
            price: price_id,
            trial_period_days: request.trial_days.unwrap_or(0),
        })
        .await?;

    info!(
        "Created subscription {} (status={})",
        subscription.id, subscription.status
    );

    Ok(CreateSubscriptionResponse {
        client_secret: subscription.payment_client_secret().map(String::from),
        trial_end: subscription.trial_end,
        subscription_id: subscription.id,
    })
}

/// Cancel a customer's live subscription, now or at period end
#[instrument(skip(state, request))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Json(request): Json<CancelSubscriptionRequest>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    cancel_subscription_inner(&*state.billing, request)
        .await
        .map(Json)
        .map_err(billing_error_to_response)
}

async fn cancel_subscription_inner(
    billing: &dyn BillingClient,
    request: CancelSubscriptionRequest,
) -> BillingResult<LifecycleResponse> {
    let Some(email) = request.email.filter(|s| !s.is_empty()) else {
        return Err(BillingError::MissingField("Email requis".to_string()));
    };

    let customer = billing
        .list_customers(&email)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BillingError::NotFound("Utilisateur non trouvé".to_string()))?;

    let live = billing
        .list_subscriptions(&SubscriptionFilter::for_customer(&customer.id))
        .await?
        .into_iter()
        .find(|sub| sub.status.is_live())
        .ok_or_else(|| {
            BillingError::NotFound("Aucun abonnement actif ou en essai trouvé.".to_string())
        })?;

    let (canceled, message) = if request.cancel_immediately.unwrap_or(false) {
        // Immediate termination; any remaining trial is forfeited
        (
            billing.cancel_subscription(&live.id).await?,
            "L'abonnement a été annulé immédiatement.",
        )
    } else {
        // Subscription stays live until the period lapses
        (
            billing.update_subscription(&live.id, true).await?,
            "L'abonnement sera annulé à la fin de la période.",
        )
    };

    info!(
        "Canceled subscription {} (status={}, immediate={})",
        canceled.id,
        canceled.status,
        request.cancel_immediately.unwrap_or(false)
    );

    Ok(LifecycleResponse {
        message: message.to_string(),
        status: canceled.status,
        subscription_id: canceled.id,
    })
}

/// Undo a pending period-end cancellation
#[instrument(skip(state, request))]
pub async fn restore_subscription(
    State(state): State<AppState>,
    Json(request): Json<RestoreSubscriptionRequest>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    restore_subscription_inner(&*state.billing, request)
        .await
        .map(Json)
        .map_err(billing_error_to_response)
}

async fn restore_subscription_inner(
    billing: &dyn BillingClient,
    request: RestoreSubscriptionRequest,
) -> BillingResult<LifecycleResponse> {
    let Some(email) = request.email.filter(|s| !s.is_empty()) else {
        return Err(BillingError::MissingField("Email requis".to_string()));
    };

    let customer = billing
        .list_customers(&email)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BillingError::NotFound("Utilisateur non trouvé".to_string()))?;

    let pending = billing
        .list_subscriptions(&SubscriptionFilter::for_customer(&customer.id))
        .await?
        .into_iter()
        .find(|sub| sub.is_pending_cancellation());

    let Some(subscription) = pending else {
        // 400, not 404: asymmetric with the sibling endpoints, but
        // existing clients match on it.
        return Err(BillingError::Conflict(
            "Aucun abonnement à restaurer.".to_string(),
        ));
    };

    let restored = billing.update_subscription(&subscription.id, false).await?;

    info!("Restored subscription {}", restored.id);

    Ok(LifecycleResponse {
        message: "L'abonnement a été restauré avec succès.".to_string(),
        status: restored.status,
        subscription_id: restored.id,
    })
}
