use crate::core::config::ProviderCredentials;
use crate::core::kernel::signer::{
    canonical_headers, canonical_query, hmac_sha256, hmac_sha256_hex, sha256_hex, utc_datetime,
    SignatureResult, Signer, SigningContext,
};
use crate::core::errors::DispatchError;

const ALGORITHM: &str = "TC3-HMAC-SHA256";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Tencent Cloud `TC3-HMAC-SHA256` signer
#[derive(Debug, Clone)]
pub struct TencentSigner<'a> {
    credentials: &'a ProviderCredentials,
    service: &'a str,
}

impl<'a> TencentSigner<'a> {
    pub fn new(credentials: &'a ProviderCredentials, service: &'a str) -> Self {
        Self {
            credentials,
            service,
        }
    }

    /// The `Authorization` header value for `ctx`
    pub fn authorization(&self, ctx: &SigningContext<'_>) -> Result<String, DispatchError> {
        let date = utc_datetime(ctx.timestamp)?.format("%Y-%m-%d").to_string();

        let action = ctx.action.to_ascii_lowercase();
        let (header_block, signed_headers) = canonical_headers(&[
            ("content-type", CONTENT_TYPE),
            ("host", ctx.host),
            ("x-tc-action", action.as_str()),
        ]);

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            ctx.method,
            ctx.uri,
            canonical_query(ctx.query),
            header_block,
            signed_headers,
            sha256_hex(ctx.body)
        );

        let scope = format!("{}/{}/tc3_request", date, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            ctx.timestamp,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let secret_date = hmac_sha256(
            format!("TC3{}", self.credentials.access_key_secret()).as_bytes(),
            date.as_bytes(),
        )?;
        let secret_service = hmac_sha256(&secret_date, self.service.as_bytes())?;
        let secret_signing = hmac_sha256(&secret_service, b"tc3_request")?;
        let signature = hmac_sha256_hex(&secret_signing, string_to_sign.as_bytes())?;

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.credentials.access_key_id(),
            scope,
            signed_headers,
            signature
        ))
    }
}

impl Signer for TencentSigner<'_> {
    fn sign_request(&self, ctx: &SigningContext<'_>) -> SignatureResult {
        let authorization = self.authorization(ctx)?;

        let headers = vec![
            ("Authorization".to_string(), authorization),
            ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
            ("Host".to_string(), ctx.host.to_string()),
            ("X-TC-Action".to_string(), ctx.action.to_string()),
            ("X-TC-Timestamp".to_string(), ctx.timestamp.to_string()),
            ("X-TC-Version".to_string(), ctx.version.to_string()),
        ];

        Ok((headers, Vec::new()))
    }
}
