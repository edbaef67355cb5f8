use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 over the raw request body using the shared secret.
/// Returns the lowercase hex-encoded MAC.
pub fn compute_hmac(secret: &[u8], body: &[u8]) -> String {
    // HMAC accepts keys of any length, so this never takes the error branch.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a webhook signature header against the body.
///
/// The header must equal the lowercase hex digest exactly. The digest has a
/// fixed 64-char length, so a length mismatch is rejected up front and equal
/// lengths are compared in constant time.
pub fn verify_hmac(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let expected = compute_hmac(secret, body);
    if expected.is_empty() || expected.len() != signature.len() {
        return false;
    }
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
