//! Callback signature scheme.
//!
//! The worker signs the raw callback body with HMAC-SHA256 keyed by the
//! per-job secret and sends the hex digest in the signature header. The
//! receiver verifies before parsing anything it intends to trust.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use mezzo_models::CallbackSecret;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body` under the job secret.
pub fn sign_body(secret: &CallbackSecret, body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification of a hex signature against `body`.
///
/// Malformed hex is simply a failed verification, not a distinct error;
/// the caller treats both the same way.
pub fn verify_signature(secret: &CallbackSecret, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac = match HmacSha256::new_from_slice(secret.expose().as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}
