use crate::core::config::ProviderCredentials;
use crate::core::errors::DispatchError;
use crate::core::kernel::signer::{
    canonical_headers, canonical_query, hmac_sha1_base64, hmac_sha256_hex, percent_encode,
    sha256_hex, utc_datetime, SignatureResult, Signer, SigningContext,
};

const ACS3_ALGORITHM: &str = "ACS3-HMAC-SHA256";

fn iso8601(timestamp: i64) -> Result<String, DispatchError> {
    Ok(utc_datetime(timestamp)?
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string())
}

/// Aliyun `ACS3-HMAC-SHA256` header signer
///
/// Signs `host`, every `x-acs-*` header it adds, and any extra headers from
/// the context. The returned headers are ready to put on the wire.
#[derive(Debug, Clone)]
pub struct AliyunAcs3Signer<'a> {
    credentials: &'a ProviderCredentials,
}

impl<'a> AliyunAcs3Signer<'a> {
    pub fn new(credentials: &'a ProviderCredentials) -> Self {
        Self { credentials }
    }
}

impl Signer for AliyunAcs3Signer<'_> {
    fn sign_request(&self, ctx: &SigningContext<'_>) -> SignatureResult {
        let date = iso8601(ctx.timestamp)?;
        let content_sha256 = sha256_hex(ctx.body);

        let mut headers: Vec<(&str, &str)> = vec![
            ("host", ctx.host),
            ("x-acs-action", ctx.action),
            ("x-acs-version", ctx.version),
            ("x-acs-date", date.as_str()),
            ("x-acs-signature-nonce", ctx.nonce),
            ("x-acs-content-sha256", content_sha256.as_str()),
        ];
        headers.extend_from_slice(ctx.headers);

        let (header_block, signed_headers) = canonical_headers(&headers);
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            ctx.method,
            ctx.uri,
            canonical_query(ctx.query),
            header_block,
            signed_headers,
            content_sha256
        );
        let string_to_sign = format!(
            "{}\n{}",
            ACS3_ALGORITHM,
            sha256_hex(canonical_request.as_bytes())
        );
        let signature = hmac_sha256_hex(
            self.credentials.access_key_secret().as_bytes(),
            string_to_sign.as_bytes(),
        )?;

        let authorization = format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            ACS3_ALGORITHM,
            self.credentials.access_key_id(),
            signed_headers,
            signature
        );

        let mut out: Vec<(String, String)> = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        out.push(("Authorization".to_string(), authorization));

        Ok((out, Vec::new()))
    }
}

/// Aliyun RPC `HMAC-SHA1` query signer
///
/// Adds the common RPC parameters to the context query and appends
/// `Signature`. Callers provide `Format` and the action's own parameters.
#[derive(Debug, Clone)]
pub struct AliyunRpcSigner<'a> {
    credentials: &'a ProviderCredentials,
}

impl<'a> AliyunRpcSigner<'a> {
    pub fn new(credentials: &'a ProviderCredentials) -> Self {
        Self { credentials }
    }

    /// Base64 signature over `METHOD&%2F&encoded(canonical query)`
    pub fn signature(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<String, DispatchError> {
        let string_to_sign = format!(
            "{}&{}&{}",
            method,
            percent_encode("/"),
            percent_encode(&canonical_query(params))
        );
        let key = format!("{}&", self.credentials.access_key_secret());
        hmac_sha1_base64(key.as_bytes(), string_to_sign.as_bytes())
    }
}

impl Signer for AliyunRpcSigner<'_> {
    fn sign_request(&self, ctx: &SigningContext<'_>) -> SignatureResult {
        let timestamp = iso8601(ctx.timestamp)?;

        let mut params: Vec<(&str, &str)> = vec![
            ("AccessKeyId", self.credentials.access_key_id()),
            ("Action", ctx.action),
            ("SignatureMethod", "HMAC-SHA1"),
            ("SignatureNonce", ctx.nonce),
            ("SignatureVersion", "1.0"),
            ("Timestamp", timestamp.as_str()),
            ("Version", ctx.version),
        ];
        params.extend_from_slice(ctx.query);

        let signature = self.signature(ctx.method, &params)?;

        let mut query: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        query.push(("Signature".to_string(), signature));

        Ok((Vec::new(), query))
    }
}
