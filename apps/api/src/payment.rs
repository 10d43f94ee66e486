//! # Payment Gateway
//!
//! Verification of the proof a client returns after paying.
//!
//! ## Modes
//! ```text
//! PAYMENT_KEY_SECRET set      signature must equal
//!                             hex(HMAC-SHA256(secret, "{gatewayOrderId}|{paymentId}"))
//!                             compared in constant time
//!
//! PAYMENT_KEY_SECRET unset    mock gateway: only a non-empty paymentId is required
//! ```
//! `gatewayOrderId` is the payment reference handed out by create-intent.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use bites_core::CoreError;

type HmacSha256 = Hmac<Sha256>;

/// Verifies payment proofs against the gateway secret.
#[derive(Clone)]
pub struct PaymentGateway {
    key_secret: Option<String>,
}

impl std::fmt::Debug for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGateway")
            .field("mode", &if self.is_mock() { "mock" } else { "hmac" })
            .finish()
    }
}

impl PaymentGateway {
    pub fn new(key_secret: Option<String>) -> Self {
        PaymentGateway { key_secret }
    }

    /// True when no secret is configured.
    pub fn is_mock(&self) -> bool {
        self.key_secret.is_none()
    }

    /// Checks a payment proof for the order with `gateway_order_id`.
    ///
    /// ## Errors
    /// `CoreError::PaymentRejected` for a missing payment id, or a missing,
    /// malformed or mismatching signature when a secret is configured.
    pub fn verify(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: Option<&str>,
    ) -> Result<(), CoreError> {
        if payment_id.trim().is_empty() {
            return Err(rejected("Payment failed"));
        }

        let Some(secret) = &self.key_secret else {
            return Ok(());
        };

        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| rejected("Missing payment signature"))?;

        let expected = hex::decode(signature).map_err(|_| rejected("Invalid payment signature"))?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| rejected("Invalid payment signature"))?;
        mac.update(signed_payload(gateway_order_id, payment_id).as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| rejected("Invalid payment signature"))
    }

    /// Signature the gateway would produce. `None` in mock mode.
    pub fn sign(&self, gateway_order_id: &str, payment_id: &str) -> Option<String> {
        let secret = self.key_secret.as_ref()?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(signed_payload(gateway_order_id, payment_id).as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

fn signed_payload(gateway_order_id: &str, payment_id: &str) -> String {
    format!("{}|{}", gateway_order_id, payment_id)
}

fn rejected(reason: &str) -> CoreError {
    CoreError::PaymentRejected {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_mode_only_needs_payment_id() {
        let gateway = PaymentGateway::new(None);
        assert!(gateway.is_mock());
        assert!(gateway.verify("ref-1", "pay_1", None).is_ok());
        assert!(gateway.verify("ref-1", "  ", None).is_err());
        assert_eq!(gateway.sign("ref-1", "pay_1"), None);
    }

    #[test]
    fn test_hmac_mode() {
        let gateway = PaymentGateway::new(Some("gateway-secret".to_string()));
        let signature = gateway.sign("ref-1", "pay_1").unwrap();
        assert_eq!(signature.len(), 64);

        assert!(gateway.verify("ref-1", "pay_1", Some(&signature)).is_ok());
        // bound to both ids
        assert!(gateway.verify("ref-2", "pay_1", Some(&signature)).is_err());
        assert!(gateway.verify("ref-1", "pay_2", Some(&signature)).is_err());
        // missing or malformed
        assert!(gateway.verify("ref-1", "pay_1", None).is_err());
        assert!(gateway.verify("ref-1", "pay_1", Some("not-hex")).is_err());
    }

    #[test]
    fn test_signature_hex_is_case_insensitive() {
        let gateway = PaymentGateway::new(Some("key".to_string()));
        let signature = gateway.sign("order_1", "pay_1").unwrap();
        assert!(gateway.verify("order_1", "pay_1", Some(&signature.to_uppercase())).is_ok());
    }
}
