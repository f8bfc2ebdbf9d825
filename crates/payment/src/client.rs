//! Checkout session creation against the payment gateway's HTTP API.

use serde::{Deserialize, Serialize};

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Transport-level failure (DNS, TLS, timeout, malformed response body).
    #[error("Payment gateway request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("Payment gateway rejected the request ({status}): {message}")]
    Upstream { status: u16, message: String },
}

/// Configuration for the payment gateway client.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Gateway base URL, e.g. `https://pay.example.com`.
    pub api_url: String,
    /// Bearer token for API calls.
    pub api_key: String,
    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
}

impl PaymentConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                 | Required |
    /// |--------------------------|----------|
    /// | `PAYMENT_API_URL`        | **yes**  |
    /// | `PAYMENT_API_KEY`        | **yes**  |
    /// | `PAYMENT_WEBHOOK_SECRET` | **yes**  |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is not set -- the server cannot take
    /// orders without a payment gateway, so misconfiguration fails fast.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("PAYMENT_API_URL")
                .expect("PAYMENT_API_URL must be set in the environment"),
            api_key: std::env::var("PAYMENT_API_KEY")
                .expect("PAYMENT_API_KEY must be set in the environment"),
            webhook_secret: std::env::var("PAYMENT_WEBHOOK_SECRET")
                .expect("PAYMENT_WEBHOOK_SECRET must be set in the environment"),
        }
    }
}

/// Request body for `POST /v1/checkouts`.
#[derive(Debug, Serialize)]
pub struct CheckoutRequest {
    /// Amount to charge in integer cents.
    pub amount_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Our opaque reference echoed back in webhooks (e.g. `"order-42"`).
    pub reference: String,
    /// Human-readable line shown on the hosted payment page.
    pub description: String,
}

/// A created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Gateway-assigned checkout identifier.
    pub provider_ref: String,
    /// Hosted payment page URL for the buyer.
    pub checkout_url: String,
}

/// Client for the payment gateway's checkout API.
pub struct PaymentClient {
    config: PaymentConfig,
    http: reqwest::Client,
}

impl PaymentClient {
    /// Create a new client with the given configuration.
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Shared secret for webhook signature verification.
    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    /// Create a hosted checkout session.
    ///
    /// Any non-success response surfaces as [`PaymentError::Upstream`] with
    /// the gateway's own message, so callers can map it to a 502.
    pub async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkouts", self.config.api_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %message, "Checkout creation rejected");
            return Err(PaymentError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let session: CheckoutSession = response.json().await?;
        tracing::info!(
            provider_ref = %session.provider_ref,
            reference = %request.reference,
            "Checkout session created"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_request_serializes_expected_fields() {
        let request = CheckoutRequest {
            amount_cents: 2500,
            currency: "EUR".to_string(),
            reference: "order-7".to_string(),
            description: "2 x Reforestation credit".to_string(),
        };

        let json = serde_json::to_value(&request).expect("serialization should succeed");
        assert_eq!(json["amount_cents"], 2500);
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["reference"], "order-7");
        assert_eq!(json["description"], "2 x Reforestation credit");
    }

    #[test]
    fn checkout_session_deserializes_from_gateway_response() {
        let body = r#"{"provider_ref":"chk_9f2","checkout_url":"https://pay.example.com/c/chk_9f2"}"#;
        let session: CheckoutSession =
            serde_json::from_str(body).expect("deserialization should succeed");
        assert_eq!(session.provider_ref, "chk_9f2");
        assert!(session.checkout_url.ends_with("chk_9f2"));
    }
}
