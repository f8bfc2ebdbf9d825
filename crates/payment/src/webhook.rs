//! Webhook signature verification.
//!
//! The gateway signs each callback body with HMAC-SHA256 over the raw bytes
//! and sends the lowercase hex digest in the `X-Payment-Signature` header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Verify a webhook signature in constant time.
pub fn verify(secret: &str, body: &[u8], signature: &str) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);

    let Ok(expected) = decode_hex(signature) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}

/// Decode a lowercase/uppercase hex string into bytes.
fn decode_hex(input: &str) -> Result<Vec<u8>, ()> {
    if input.len() % 2 != 0 {
        return Err(());
    }
    (0..input.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&input[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let secret = "whsec_test";
        let body = br#"{"provider_ref":"chk_9f2","status":"paid"}"#;
        let signature = sign(secret, body);
        assert!(verify(secret, body, &signature));
    }

    #[test]
    fn tampered_body_fails_verification() {
        let secret = "whsec_test";
        let signature = sign(secret, b"original");
        assert!(!verify(secret, b"tampered", &signature));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let body = b"payload";
        let signature = sign("secret-a", body);
        assert!(!verify("secret-b", body, &signature));
    }

    #[test]
    fn malformed_signature_fails_verification() {
        assert!(!verify("secret", b"payload", "not-hex"));
        assert!(!verify("secret", b"payload", "abc")); // odd length
    }
}
