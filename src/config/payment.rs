//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Payment configuration (Razorpay)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Razorpay key id (public half of the API credential pair)
    pub razorpay_key_id: String,

    /// Razorpay key secret; also signs checkout-callback verification
    pub razorpay_key_secret: SecretString,

    /// Webhook signing secret configured in the Razorpay dashboard
    pub razorpay_webhook_secret: SecretString,

    /// Gateway API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout against the gateway, in seconds
    #[serde(default = "default_gateway_timeout")]
    pub request_timeout_secs: u64,

    /// Mint a local mock order when the gateway is unreachable.
    /// Never allowed in production.
    #[serde(default)]
    pub allow_mock_fallback: bool,

    /// Tolerance when comparing client order totals, in minor units
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: i64,
}

impl PaymentConfig {
    /// Check if using Razorpay test mode
    pub fn is_test_mode(&self) -> bool {
        self.razorpay_key_id.starts_with("rzp_test_")
    }

    /// Check if using Razorpay live mode
    pub fn is_live_mode(&self) -> bool {
        self.razorpay_key_id.starts_with("rzp_live_")
    }

    /// Get gateway request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.razorpay_key_id.is_empty() {
            return Err(ValidationError::MissingRequired("RAZORPAY_KEY_ID"));
        }
        if self.razorpay_key_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("RAZORPAY_KEY_SECRET"));
        }
        if self.razorpay_webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("RAZORPAY_WEBHOOK_SECRET"));
        }

        // Verify key prefix for safety
        if !self.razorpay_key_id.starts_with("rzp_") {
            return Err(ValidationError::InvalidGatewayKeyId);
        }
        if !self.base_url.starts_with("https://") {
            return Err(ValidationError::GatewayUrlMustBeHttps);
        }
        if self.amount_tolerance < 0 {
            return Err(ValidationError::InvalidAmountTolerance);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.allow_mock_fallback && *environment == Environment::Production {
            return Err(ValidationError::MockFallbackInProduction);
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            razorpay_key_id: String::new(),
            razorpay_key_secret: SecretString::new(String::new()),
            razorpay_webhook_secret: SecretString::new(String::new()),
            base_url: default_base_url(),
            request_timeout_secs: default_gateway_timeout(),
            allow_mock_fallback: false,
            amount_tolerance: default_amount_tolerance(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.razorpay.com".to_string()
}

fn default_gateway_timeout() -> u64 {
    10
}

fn default_amount_tolerance() -> i64 {
    10
}
