//! # Stripe REST Client
//!
//! `BillingClient` implementation against the Stripe HTTP API.
//! Requests are form-encoded, responses are JSON; every method is a
//! single API call with no retries (failures surface to the caller).

use crate::config::StripeConfig;
use async_trait::async_trait;
use bill_core::{
    BillingClient, BillingError, BillingResult, Customer, NewSubscription, PaymentIntent, Price,
    Product, Subscription, SubscriptionFilter,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, instrument};

/// Stripe implementation of the billing capability
pub struct StripeClient {
    config: StripeConfig,
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(config: StripeConfig) -> BillingResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BillingError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> BillingResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> BillingResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .query(query)
            .send()
            .await
            .map_err(|e| BillingError::Network(e.to_string()))?;

        Self::decode(path, response).await
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> BillingResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(params)
            .send()
            .await
            .map_err(|e| BillingError::Network(e.to_string()))?;

        Self::decode(path, response).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> BillingResult<T> {
        let response = self
            .client
            .delete(self.url(path))
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| BillingError::Network(e.to_string()))?;

        Self::decode(path, response).await
    }

    /// Common response handling: surface Stripe's own error message on
    /// non-2xx, otherwise parse the typed body.
    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> BillingResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BillingError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: path={}, status={}, body={}", path, status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(BillingError::Provider {
                    message: error_response.error.message,
                });
            }

            return Err(BillingError::Provider {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            BillingError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

#[async_trait]
impl BillingClient for StripeClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> BillingResult<Vec<Product>> {
        let list: StripeList<Product> = self.get("products", &[]).await?;
        debug!("Listed {} products", list.data.len());
        Ok(list.data)
    }

    #[instrument(skip(self))]
    async fn list_prices(&self) -> BillingResult<Vec<Price>> {
        let list: StripeList<Price> = self.get("prices", &[]).await?;
        Ok(list.data)
    }

    #[instrument(skip(self, email))]
    async fn list_customers(&self, email: &str) -> BillingResult<Vec<Customer>> {
        let list: StripeList<Customer> = self
            .get("customers", &[("email", email.to_string())])
            .await?;
        Ok(list.data)
    }

    #[instrument(skip(self, email))]
    async fn create_customer(&self, email: &str) -> BillingResult<Customer> {
        self.post_form(
            "customers",
            &[("email".to_string(), email.to_string())],
        )
        .await
    }

    #[instrument(skip(self, filter), fields(status = filter.status.as_str()))]
    async fn list_subscriptions(
        &self,
        filter: &SubscriptionFilter,
    ) -> BillingResult<Vec<Subscription>> {
        let mut query = vec![
            ("status", filter.status.as_str().to_string()),
            ("limit", filter.limit.to_string()),
        ];
        if let Some(ref customer) = filter.customer {
            query.push(("customer", customer.clone()));
        }

        let list: StripeList<Subscription> = self.get("subscriptions", &query).await?;
        Ok(list.data)
    }

    #[instrument(skip(self, req), fields(customer = %req.customer, price = %req.price))]
    async fn create_subscription(&self, req: &NewSubscription) -> BillingResult<Subscription> {
        let params = vec![
            ("customer".to_string(), req.customer.clone()),
            ("items[0][price]".to_string(), req.price.clone()),
            (
                "trial_period_days".to_string(),
                req.trial_period_days.to_string(),
            ),
            // Payment is authorized but not confirmed until the client
            // completes it with the returned client secret.
            (
                "payment_behavior".to_string(),
                "default_incomplete".to_string(),
            ),
            (
                "expand[]".to_string(),
                "latest_invoice.payment_intent".to_string(),
            ),
        ];

        self.post_form("subscriptions", &params).await
    }

    #[instrument(skip(self))]
    async fn update_subscription(
        &self,
        subscription_id: &str,
        cancel_at_period_end: bool,
    ) -> BillingResult<Subscription> {
        self.post_form(
            &format!("subscriptions/{}", subscription_id),
            &[(
                "cancel_at_period_end".to_string(),
                cancel_at_period_end.to_string(),
            )],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn cancel_subscription(&self, subscription_id: &str) -> BillingResult<Subscription> {
        self.delete(&format!("subscriptions/{}", subscription_id))
            .await
    }

    #[instrument(skip(self))]
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> BillingResult<PaymentIntent> {
        self.post_form(
            "payment_intents",
            &[
                ("amount".to_string(), amount.to_string()),
                ("currency".to_string(), currency.to_string()),
                ("payment_method_types[]".to_string(), "card".to_string()),
            ],
        )
        .await
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bill_core::SubscriptionStatus;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> StripeClient {
        let config =
            StripeConfig::new("sk_test_abc", "whsec_x").with_api_base_url(server.uri());
        StripeClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_list_customers_by_email() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/customers"))
            .and(query_param("email", "a@ex.com"))
            .and(header("Authorization", "Bearer sk_test_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{ "id": "cus_1", "email": "a@ex.com" }]
            })))
            .mount(&server)
            .await;

        let customers = client_for(&server).list_customers("a@ex.com").await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].id, "cus_1");
    }

    #[tokio::test]
    async fn test_create_subscription_params() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/subscriptions"))
            .and(body_string_contains("customer=cus_1"))
            .and(body_string_contains("trial_period_days=14"))
            .and(body_string_contains("payment_behavior=default_incomplete"))
            .and(body_string_contains("latest_invoice.payment_intent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "sub_1",
                "customer": "cus_1",
                "status": "trialing",
                "trial_end": 1900000000i64,
                "created": 1700000000i64,
                "latest_invoice": {
                    "id": "in_1",
                    "payment_intent": { "id": "pi_1", "client_secret": "pi_1_secret" }
                }
            })))
            .mount(&server)
            .await;

        let sub = client_for(&server)
            .create_subscription(&NewSubscription {
                customer: "cus_1".into(),
                price: "price_1".into(),
                trial_period_days: 14,
            })
            .await
            .unwrap();

        assert_eq!(sub.id, "sub_1");
        assert_eq!(sub.status, SubscriptionStatus::Trialing);
        assert_eq!(sub.payment_client_secret(), Some("pi_1_secret"));
    }

    #[tokio::test]
    async fn test_cancel_uses_delete() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v1/subscriptions/sub_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "sub_1",
                "customer": "cus_1",
                "status": "canceled",
                "created": 1700000000i64
            })))
            .mount(&server)
            .await;

        let sub = client_for(&server).cancel_subscription("sub_1").await.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
    }

    #[tokio::test]
    async fn test_provider_error_message_surfaces() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/products"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "message": "No such resource", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).list_products().await.unwrap_err();
        assert_eq!(err.to_string(), "No such resource");
        assert_eq!(err.status_code(), 500);
    }
}
