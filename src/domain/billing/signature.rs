//! HMAC-SHA256 verification for payment confirmations.
//!
//! Two confirmation channels carry signatures computed with different keys
//! over different canonical messages:
//!
//! - checkout callback: key secret over `"{order_id}|{payment_id}"`, signature
//!   sent as lowercase hex in the request body;
//! - webhook: webhook secret over the raw request body bytes, signature sent
//!   as lowercase hex in the `X-Razorpay-Signature` header.
//!
//! Comparisons are constant-time. Synthetic orders minted by the fallback
//! gateway carry no real signature and are exempt from checkout verification.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of order ids minted by the fallback gateway.
pub const SYNTHETIC_ORDER_PREFIX: &str = "order_mock_";

/// Whether an order id was minted locally rather than by the gateway.
pub fn is_synthetic_order(order_id: &str) -> bool {
    order_id.starts_with(SYNTHETIC_ORDER_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature is not valid hex")]
    MalformedSignature,

    #[error("Signature verification failed")]
    Mismatch,
}

/// Verifies confirmation signatures for both channels.
pub struct PaymentSignatureVerifier {
    key_secret: SecretString,
    webhook_secret: SecretString,
}

impl PaymentSignatureVerifier {
    pub fn new(key_secret: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            key_secret,
            webhook_secret,
        }
    }

    /// Verifies a checkout-callback signature over `order_id|payment_id`.
    pub fn verify_checkout(
        &self,
        order_id: &str,
        payment_id: &str,
        signature_hex: &str,
    ) -> Result<(), SignatureError> {
        let message = format!("{}|{}", order_id, payment_id);
        verify_hex(
            self.key_secret.expose_secret().as_bytes(),
            message.as_bytes(),
            signature_hex,
        )
    }

    /// Verifies a webhook signature over the raw body bytes.
    pub fn verify_webhook(&self, body: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
        verify_hex(
            self.webhook_secret.expose_secret().as_bytes(),
            body,
            signature_hex,
        )
    }
}

fn verify_hex(key: &[u8], message: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
    let provided = hex::decode(signature_hex).map_err(|_| SignatureError::MalformedSignature)?;

    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|_| SignatureError::MalformedSignature)?;
    mac.update(message);
    let expected = mac.finalize().into_bytes();

    if expected.ct_eq(provided.as_slice()).into() {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(key: &str, message: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).unwrap();
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }

    fn verifier() -> PaymentSignatureVerifier {
        PaymentSignatureVerifier::new(
            SecretString::new("test_key_secret".to_string()),
            SecretString::new("test_webhook_secret".to_string()),
        )
    }

    #[test]
    fn checkout_signature_verifies_over_pipe_joined_ids() {
        let sig = sign("test_key_secret", b"order_abc|pay_xyz");
        assert!(verifier().verify_checkout("order_abc", "pay_xyz", &sig).is_ok());
    }

    #[test]
    fn checkout_signature_rejects_wrong_payment_id() {
        let sig = sign("test_key_secret", b"order_abc|pay_xyz");
        assert_eq!(
            verifier().verify_checkout("order_abc", "pay_other", &sig),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn checkout_signature_rejects_wrong_key() {
        let sig = sign("other_secret", b"order_abc|pay_xyz");
        assert_eq!(
            verifier().verify_checkout("order_abc", "pay_xyz", &sig),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn webhook_signature_verifies_over_raw_body() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = sign("test_webhook_secret", body);
        assert!(verifier().verify_webhook(body, &sig).is_ok());
    }

    #[test]
    fn webhook_signature_rejects_tampered_body() {
        let sig = sign("test_webhook_secret", br#"{"event":"payment.captured"}"#);
        assert_eq!(
            verifier().verify_webhook(br#"{"event":"payment.failed"}"#, &sig),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn non_hex_signature_is_malformed() {
        assert_eq!(
            verifier().verify_checkout("order_abc", "pay_xyz", "not-hex!"),
            Err(SignatureError::MalformedSignature)
        );
    }

    #[test]
    fn synthetic_order_detection_is_prefix_based() {
        assert!(is_synthetic_order("order_mock_1724659200000"));
        assert!(!is_synthetic_order("order_N5qFf8mock"));
        assert!(!is_synthetic_order("order_N5qFf8abc123"));
    }
}
