//! Webhook signature verification
//!
//! The partner signs webhook deliveries with HMAC-SHA256 over the raw
//! body, hex-encoded in the signature header. Verification is
//! constant-time and never errors: any malformed input is simply an
//! invalid signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook signature against the raw payload.
#[must_use]
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    if secret.is_empty() || signature.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(signature.trim()) else {
        debug!("webhook signature is not valid hex");
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Hex HMAC-SHA256 signature for a payload. Used to exercise the
/// verification path and by sandbox tooling that simulates deliveries.
#[must_use]
pub fn sign(secret: &str, payload: &[u8]) -> String {
    match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const SECRET: &str = "hook-secret";
    const PAYLOAD: &[u8] = br#"{"orderId":"order-1","code":"PLACED"}"#;

    #[test]
    fn accepts_valid_signature() {
        let signature = sign(SECRET, PAYLOAD);
        assert!(verify_signature(SECRET, PAYLOAD, &signature));
    }

    #[test]
    fn rejects_tampered_payload() {
        let signature = sign(SECRET, PAYLOAD);
        assert!(!verify_signature(SECRET, b"{\"orderId\":\"order-2\"}", &signature));
    }

    #[test]
    fn rejects_wrong_secret() {
        let signature = sign("other-secret", PAYLOAD);
        assert!(!verify_signature(SECRET, PAYLOAD, &signature));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(!verify_signature(SECRET, PAYLOAD, "not-hex!"));
    }

    #[test]
    fn rejects_empty_inputs() {
        let signature = sign(SECRET, PAYLOAD);
        assert!(!verify_signature("", PAYLOAD, &signature));
        assert!(!verify_signature(SECRET, PAYLOAD, ""));
    }

    #[test]
    fn accepts_uppercase_hex() {
        let signature = sign(SECRET, PAYLOAD).to_uppercase();
        assert!(verify_signature(SECRET, PAYLOAD, &signature));
    }
}
