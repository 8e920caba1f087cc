//! HMAC-SHA256 signatures of webhook deliveries.
//!
//! CloudConvert signs the raw request body with the subscription's signing
//! secret and sends the lowercase hex digest in `CloudConvert-Signature`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "CloudConvert-Signature";

fn keyed_mac(secret: &str, body: &[u8]) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return None,
    };
    mac.update(body);
    Some(mac)
}

/// Hex digest of `body` keyed by `secret`; empty if the key is unusable.
pub fn sign(secret: &str, body: &[u8]) -> String {
    keyed_mac(secret, body)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Check a delivery signature in constant time.
///
/// Only the exact lowercase hex digest is accepted.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    if !signature
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return false;
    }

    let Some(mac) = keyed_mac(secret, body) else {
        return false;
    };

    let expected_bytes = match hex::decode(signature) {
        Ok(b) => b,
        Err(_) => return false,
    };

    mac.verify_slice(&expected_bytes).is_ok()
}
