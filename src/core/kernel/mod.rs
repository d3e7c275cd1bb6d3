/// `RelayX` Kernel - shared transport layer for all providers
///
/// The kernel holds only transport concerns and generic interfaces; nothing
/// in here knows about a particular vendor.
///
/// ## Transport
/// - `HttpExecutor`: executes a signed request under an `HttpPolicy`
/// - `execute_with_retry` / `retry_if`: fixed-delay retry with cancellation
///
/// ## Authentication
/// - `Signer`: pluggable signing interface over a `SigningContext`
/// - hashing, HMAC and canonicalisation helpers shared by vendor signers
///
/// ## Response handling
/// - `ResponseCodec`: vendor body decoding, business errors first
///
/// # Example
/// ```rust,no_run
/// use relayx::core::config::HttpPolicy;
/// use relayx::core::kernel::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = HttpExecutorBuilder::new(
///     HttpPolicy::default().with_call_timeout(Duration::from_secs(10)),
/// )
/// .build()?;
///
/// let request = SignedRequest::post("https://sms.example.com/")
///     .with_header("Content-Type", "application/json; charset=utf-8")
///     .with_body(br#"{"a":"b"}"#.to_vec());
///
/// let response = execute_with_retry(
///     |_| executor.execute(request.clone()),
///     RetryPolicy::new(3, Duration::from_millis(200)),
///     None,
/// )
/// .await?;
/// println!("{} bytes", response.body.len());
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod rest;
pub mod signer;

// Re-export key types for convenience
pub use codec::{bounded_snippet, parse_json, ResponseCodec};
pub use rest::{
    endpoint_parts, execute_with_retry, retry_if, HttpExecutor, HttpExecutorBuilder, HttpResponse,
    ReqwestExecutor, RetryPolicy, SignedRequest,
};
pub use signer::{SignatureResult, Signer, SigningContext};
