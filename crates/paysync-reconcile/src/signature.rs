//! Webhook signature verification.

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-512 of `order_id + status_code + gross_amount + secret`
/// (plain concatenation, no delimiters).
pub fn signature_digest(order_id: &str, status_code: &str, gross_amount: &str, secret: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verifies a webhook signature.
///
/// Fails closed: any empty input is rejected before a digest is computed.
/// The comparison is byte-for-byte and constant-time.
pub fn verify_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    provided: &str,
    secret: &str,
) -> bool {
    if [order_id, status_code, gross_amount, provided, secret]
        .iter()
        .any(|s| s.is_empty())
    {
        return false;
    }
    let expected = signature_digest(order_id, status_code, gross_amount, secret);
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
