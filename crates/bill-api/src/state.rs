//! # Application State
//!
//! Shared state for the two axum services. The API service carries the
//! injected billing client; the webhook service carries the signature
//! verifier and the event handler.

use bill_core::SharedBillingClient;
use bill_stripe::{EventHandler, LoggingEventHandler, StripeClient, WebhookVerifier};
use std::sync::Arc;

/// Service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// API service port
    pub port: u16,
    /// Webhook service port
    pub webhook_port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            webhook_port: std::env::var("PORT_WEBHOOK")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5002),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Socket address of the API service
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Socket address of the webhook service
    pub fn webhook_socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.webhook_port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared state of the billing API service
#[derive(Clone)]
pub struct AppState {
    /// Injected billing capability (real Stripe client in the binary,
    /// fakes in tests)
    pub billing: SharedBillingClient,
    /// Service config
    pub config: AppConfig,
}

impl AppState {
    /// Create state backed by the real Stripe client
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let stripe = StripeClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self {
            billing: Arc::new(stripe),
            config,
        })
    }

    /// Create state with an explicit billing client (for tests)
    pub fn with_client(billing: SharedBillingClient) -> Self {
        Self {
            billing,
            config: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 5001,
                webhook_port: 5002,
                environment: "test".to_string(),
            },
        }
    }
}

/// Shared state of the webhook service
#[derive(Clone)]
pub struct WebhookState {
    pub verifier: WebhookVerifier,
    /// Dispatch target; logging-only by default
    pub handler: Arc<dyn EventHandler>,
}

impl WebhookState {
    /// Create state from the configured webhook signing secret
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            verifier: WebhookVerifier::new(webhook_secret),
            handler: Arc::new(LoggingEventHandler),
        }
    }

    /// Swap in a custom event handler
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handler = handler;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("PORT_WEBHOOK");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5001);
        assert_eq!(config.webhook_port, 5002);
    }

    #[test]
    fn test_socket_addrs() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 5001,
            webhook_port: 5002,
            environment: "test".to_string(),
        };

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5001");
        assert_eq!(config.webhook_socket_addr().to_string(), "0.0.0.0:5002");
        assert!(!config.is_production());
    }
}
