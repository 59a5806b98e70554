use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Signs a webhook payload with the shared callback secret.
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMac can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies the signature header on an inbound webhook delivery. Deliveries
/// without a valid signature are dropped before any state is touched.
pub fn verify(payload: &[u8], signature: &str, secret: &str) -> bool {
    sign(payload, secret) == signature
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_round_trips() {
        let payload = br#"{"merchant_reference":"ref-1","status":"COMPLETED"}"#;
        let signature = sign(payload, "webhook-secret");

        assert!(verify(payload, &signature, "webhook-secret"));
    }

    #[test]
    fn wrong_secret_or_tampered_payload_fails() {
        let payload = br#"{"merchant_reference":"ref-1","status":"COMPLETED"}"#;
        let signature = sign(payload, "webhook-secret");

        assert!(!verify(payload, &signature, "other-secret"));
        assert!(!verify(
            br#"{"merchant_reference":"ref-2","status":"COMPLETED"}"#,
            &signature,
            "webhook-secret"
        ));
        assert!(!verify(payload, "deadbeef", "webhook-secret"));
    }
}
