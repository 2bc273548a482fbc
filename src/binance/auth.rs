//! Authentication utilities for the Binance Futures API

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::errors::{BotError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Generate the HMAC-SHA256 signature for a signed request
///
/// Binance signs the exact urlencoded query string (including the timestamp
/// parameter) and expects the signature hex-encoded.
///
/// # Arguments
/// * `secret` - API secret key
/// * `query_string` - The urlencoded query string to sign
pub fn sign_query(secret: &str, query_string: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BotError::Internal(format!("Failed to create HMAC: {}", e)))?;
    mac.update(query_string.as_bytes());
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Serialize request parameters into a query string
///
/// Parameter values this client produces (symbols, decimals, enum names,
/// booleans) contain no characters that need percent-escaping, so the
/// serialization is a plain join. The same string is both signed and sent.
pub fn encode_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Current timestamp in milliseconds, as Binance expects
pub fn request_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
