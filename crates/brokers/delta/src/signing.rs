//! Delta request signing.
//!
//! Signed endpoints carry `api-key`, `timestamp` (Unix seconds) and
//! `signature` headers, where the signature is the hex HMAC-SHA256 of
//! `METHOD + timestamp + path + query + body` keyed with the API secret.
//! `query` includes its leading `?` and is empty when there is none.

use deltaprobe_core::ApiError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The exact string that gets signed.
pub fn signature_payload(
    method: &str,
    timestamp: &str,
    path: &str,
    query_string: &str,
    body: &str,
) -> String {
    format!("{}{}{}{}{}", method, timestamp, path, query_string, body)
}

/// Hex-encoded HMAC-SHA256 signature for one request.
pub fn sign(
    secret: &str,
    method: &str,
    timestamp: &str,
    path: &str,
    query_string: &str,
    body: &str,
) -> Result<String, ApiError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid API secret: {}", e)))?;
    mac.update(signature_payload(method, timestamp, path, query_string, body).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
