use crate::core::errors::DispatchError;
use base64::engine::general_purpose;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Result type for signing operations: (headers, `query_params`)
pub type SignatureResult = Result<(Vec<(String, String)>, Vec<(String, String)>), DispatchError>;

/// Everything a signer needs for one request
///
/// Built fresh for every call and never cached. The timestamp and nonce are
/// explicit so that signing is a pure function of this value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigningContext<'a> {
    /// HTTP method, upper case
    pub method: &'a str,
    pub host: &'a str,
    /// Request path, `/` for the vendor root
    pub uri: &'a str,
    /// Unencoded query parameters
    pub query: &'a [(&'a str, &'a str)],
    /// Extra headers that take part in signing
    pub headers: &'a [(&'a str, &'a str)],
    /// Exact body bytes sent on the wire
    pub body: &'a [u8],
    pub action: &'a str,
    pub version: &'a str,
    /// Unix seconds
    pub timestamp: i64,
    pub nonce: &'a str,
}

/// Signer trait for request authentication
///
/// Implementations turn a [`SigningContext`] into the vendor headers and
/// query parameters that must accompany the request.
pub trait Signer: Send + Sync {
    fn sign_request(&self, ctx: &SigningContext<'_>) -> SignatureResult;
}

/// Lower-case hex SHA-256 of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, DispatchError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| DispatchError::Signing(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> Result<String, DispatchError> {
    hmac_sha256(key, data).map(hex::encode)
}

/// Standard base64 of HMAC-SHA1(`key`, `data`)
pub fn hmac_sha1_base64(key: &[u8], data: &[u8]) -> Result<String, DispatchError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| DispatchError::Signing(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Escapes everything except `A-Z a-z 0-9 - _ . ~`, space becomes `%20`
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Pairs sorted by key (then value), each side percent-encoded, joined by `&`
pub fn canonical_query(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical header block and signed-header list
///
/// Names are lower-cased and values trimmed; the block has one `name:value\n`
/// line per header, sorted by name, and the list joins names with `;`.
pub fn canonical_headers(headers: &[(&str, &str)]) -> (String, String) {
    let mut normalized: Vec<(String, &str)> = headers
        .iter()
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim()))
        .collect();
    normalized.sort_by(|a, b| a.0.cmp(&b.0));

    let block = normalized
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect::<String>();
    let signed = normalized
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    (block, signed)
}

pub fn utc_datetime(timestamp: i64) -> Result<DateTime<Utc>, DispatchError> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| DispatchError::Signing(format!("Timestamp out of range: {}", timestamp)))
}

/// Current unix time in seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Fresh random nonce for replay protection
pub fn random_nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}
