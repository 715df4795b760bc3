//! # Billing Error Types
//!
//! Typed error handling for the featherbill billing façade.
//! All billing operations return `Result<T, BillingError>`.

use thiserror::Error;

/// Core error type for all billing operations
#[derive(Debug, Error)]
pub enum BillingError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or malformed client input. The message is surfaced
    /// verbatim in the HTTP response body.
    #[error("{0}")]
    MissingField(String),

    /// No matching customer or subscription
    #[error("{0}")]
    NotFound(String),

    /// Business-rule conflict (duplicate live subscription, nothing to
    /// restore). Maps to 400, not 409; existing clients match on the
    /// status codes.
    #[error("{0}")]
    Conflict(String),

    /// Billing provider API error. Displays the provider's raw message
    /// so callers see exactly what the provider said.
    #[error("{message}")]
    Provider { message: String },

    /// Network/HTTP error communicating with the provider
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerification(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BillingError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BillingError::Configuration(_) => 500,
            BillingError::MissingField(_) => 400,
            BillingError::NotFound(_) => 404,
            BillingError::Conflict(_) => 400,
            BillingError::Provider { .. } => 500,
            BillingError::Network(_) => 500,
            BillingError::WebhookVerification(_) => 400,
            BillingError::WebhookParse(_) => 400,
            BillingError::Serialization(_) => 500,
        }
    }

    /// Returns true if this error originated upstream rather than from
    /// the caller's request.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            BillingError::Provider { .. } | BillingError::Network(_)
        )
    }
}

/// Result type alias for billing operations
pub type BillingResult<T> = Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            BillingError::MissingField("priceId et email sont requis".into()).status_code(),
            400
        );
        assert_eq!(
            BillingError::NotFound("Utilisateur non trouvé".into()).status_code(),
            404
        );
        assert_eq!(
            BillingError::Conflict("Aucun abonnement à restaurer.".into()).status_code(),
            400
        );
        assert_eq!(
            BillingError::Provider {
                message: "No such price: 'price_x'".into()
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn test_provider_message_is_verbatim() {
        let err = BillingError::Provider {
            message: "No such customer: 'cus_x'".into(),
        };
        assert_eq!(err.to_string(), "No such customer: 'cus_x'");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_client_errors_are_not_upstream() {
        assert!(!BillingError::MissingField("Email requis".into()).is_upstream());
        assert!(!BillingError::WebhookVerification("Signature mismatch".into()).is_upstream());
    }
}
