//! # Stripe Configuration
//!
//! Configuration management for the Stripe integration.
//! All secrets are loaded from environment variables.

use bill_core::BillingError;
use std::env;

/// Stripe API configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: String,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SECRET_KEY`
    /// - `STRIPE_WEBHOOK_SECRET`
    pub fn from_env() -> Result<Self, BillingError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("STRIPE_SECRET_KEY")
            .map_err(|_| BillingError::Configuration("STRIPE_SECRET_KEY not set".to_string()))?;

        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
            BillingError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
        })?;

        validate_key_prefixes(&secret_key, &webhook_secret)?;

        Ok(Self {
            secret_key,
            webhook_secret,
            api_base_url: "https://api.stripe.com".to_string(),
            api_version: "2024-12-18.acacia".to_string(),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base_url: "https://api.stripe.com".to_string(),
            api_version: "2024-12-18.acacia".to_string(),
        }
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Reject keys that cannot be Stripe credentials before any request
/// carries them.
fn validate_key_prefixes(secret_key: &str, webhook_secret: &str) -> Result<(), BillingError> {
    if !secret_key.starts_with("sk_test_") && !secret_key.starts_with("sk_live_") {
        return Err(BillingError::Configuration(
            "STRIPE_SECRET_KEY must start with sk_test_ or sk_live_".to_string(),
        ));
    }

    if !webhook_secret.starts_with("whsec_") {
        return Err(BillingError::Configuration(
            "STRIPE_WEBHOOK_SECRET must start with whsec_".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_modes() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        assert!(config.is_test_mode());

        let config = StripeConfig::new("sk_live_abc123", "whsec_secret");
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_auth_header() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
    }

    #[test]
    fn test_rejects_malformed_secret_key() {
        let err = validate_key_prefixes("bogus_key", "whsec_secret").unwrap_err();
        assert!(matches!(err, BillingError::Configuration(_)));
        assert!(err.to_string().contains("sk_test_"));
    }

    #[test]
    fn test_rejects_malformed_webhook_secret() {
        let err = validate_key_prefixes("sk_test_abc", "secret").unwrap_err();
        assert!(matches!(err, BillingError::Configuration(_)));
        assert!(err.to_string().contains("whsec_"));
    }

    #[test]
    fn test_accepts_both_key_modes() {
        assert!(validate_key_prefixes("sk_test_abc", "whsec_x").is_ok());
        assert!(validate_key_prefixes("sk_live_abc", "whsec_x").is_ok());
    }

    #[test]
    fn test_from_env_missing_key() {
        std::env::remove_var("STRIPE_SECRET_KEY");

        let err = StripeConfig::from_env().unwrap_err();
        assert!(matches!(err, BillingError::Configuration(_)));
    }

    #[test]
    fn test_base_url_override() {
        let config =
            StripeConfig::new("sk_test_abc", "whsec_x").with_api_base_url("http://127.0.0.1:9");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9");
    }
}
