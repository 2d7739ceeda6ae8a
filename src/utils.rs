use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Lowercase hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign(body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Checks an `X-Hub-Signature-256` header value (`sha256=<hex>`) against the body.
pub fn verify_signature(signature: &str, body: &[u8], secret: &str) -> bool {
    let Some(supplied) = signature.trim().strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Some(expected) = sign(body, secret) else {
        return false;
    };
    constant_time_eq(expected.as_bytes(), supplied.as_bytes())
}

/// Compares every byte of equal-length inputs; only the length check short-circuits.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
