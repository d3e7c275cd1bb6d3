use crate::core::config::HttpPolicy;
use crate::core::errors::{DispatchError, ProtocolError};
use crate::core::kernel::codec::bounded_snippet;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

/// One fully signed request, ready for the wire
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl SignedRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }
}

/// Host (with any explicit port) and path of an endpoint URL, as signed
pub fn endpoint_parts(endpoint: &str) -> Result<(String, String), DispatchError> {
    let url = reqwest::Url::parse(endpoint).map_err(|e| {
        DispatchError::configuration(format!("invalid endpoint {}: {}", endpoint, e))
    })?;
    let host = url.host_str().ok_or_else(|| {
        DispatchError::configuration(format!("endpoint {} has no host", endpoint))
    })?;
    let host = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Ok((host, url.path().to_string()))
}

/// A 2xx response whose body fit under the size ceiling
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes signed requests under the configured HTTP policy
///
/// Non-2xx, empty 2xx bodies and oversized bodies are all errors; only a
/// complete, bounded body is ever handed back.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: SignedRequest) -> Result<HttpResponse, DispatchError>;
}

/// Builder for creating executor instances
pub struct HttpExecutorBuilder {
    policy: HttpPolicy,
}

impl HttpExecutorBuilder {
    pub fn new(policy: HttpPolicy) -> Self {
        Self { policy }
    }

    pub fn build(self) -> Result<ReqwestExecutor, DispatchError> {
        let policy = self.policy;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &policy.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                DispatchError::configuration(format!("Invalid default header name {}: {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                DispatchError::configuration(format!("Invalid default header value: {}", e))
            })?;
            default_headers.insert(name, value);
        }

        let mut builder = Client::builder()
            .connect_timeout(policy.connect_timeout)
            .read_timeout(policy.read_timeout)
            .user_agent(&policy.user_agent)
            .default_headers(default_headers);

        if let Some(proxy) = &policy.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| {
                DispatchError::configuration(format!("Invalid proxy URL: {}", e))
            })?;
            builder = builder.proxy(proxy);
        }

        if let Some(path) = &policy.ca_cert_pem {
            let pem = std::fs::read(path).map_err(|e| {
                DispatchError::configuration(format!(
                    "Failed to read CA certificate {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                DispatchError::configuration(format!("Invalid CA certificate: {}", e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder.build().map_err(|e| {
            DispatchError::configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(ReqwestExecutor { client, policy })
    }
}

/// Implementation of `HttpExecutor` using reqwest
#[derive(Clone)]
pub struct ReqwestExecutor {
    client: Client,
    policy: HttpPolicy,
}

impl std::fmt::Debug for ReqwestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ReqwestExecutor {
    pub fn new(policy: HttpPolicy) -> Result<Self, DispatchError> {
        HttpExecutorBuilder::new(policy).build()
    }

    pub fn policy(&self) -> &HttpPolicy {
        &self.policy
    }

    async fn send(&self, request: SignedRequest) -> Result<HttpResponse, DispatchError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let pending = builder.body(request.body).send();

        let response = match self.policy.write_timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                DispatchError::transport(
                    format!("No response headers within {}ms", limit.as_millis()),
                    true,
                )
            })??,
            None => pending.await?,
        };

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        if !status.is_success() {
            let body = self.read_body(response).await.unwrap_or_default();
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                snippet: bounded_snippet(&body),
            }
            .into());
        }

        let body = self.read_body(response).await?;
        trace!(bytes = body.len(), "Response body received");

        if body.is_empty() {
            return Err(ProtocolError::EmptyBody {
                status: status.as_u16(),
            }
            .into());
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }

    /// Read the whole body, failing as soon as it exceeds the ceiling
    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>, DispatchError> {
        let limit = self.policy.max_body_bytes;

        if let Some(declared) = response.content_length() {
            if declared > limit as u64 {
                return Err(ProtocolError::BodyTooLarge {
                    limit,
                    observed: declared,
                }
                .into());
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let observed = body.len() + chunk.len();
            if observed > limit {
                return Err(ProtocolError::BodyTooLarge {
                    limit,
                    observed: observed as u64,
                }
                .into());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: SignedRequest) -> Result<HttpResponse, DispatchError> {
        let result = match self.policy.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.send(request))
                .await
                .unwrap_or_else(|_| {
                    Err(DispatchError::transport(
                        format!("Call exceeded {}ms", limit.as_millis()),
                        true,
                    ))
                }),
            None => self.send(request).await,
        };

        match &result {
            Ok(response) => debug!(status = response.status, "HTTP call succeeded"),
            Err(e) => debug!(code = %e.code(), "HTTP call failed: {}", e),
        }
        result
    }
}

/// Fixed-delay retry settings; the first attempt counts toward `max_attempts`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// A single attempt
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `action` up to `policy.max_attempts` times with a fixed delay
///
/// Every failure is retried. The last attempt's error is returned; a
/// cancellation observed while waiting yields [`DispatchError::Cancelled`].
pub async fn execute_with_retry<T, F, Fut>(
    action: F,
    policy: RetryPolicy,
    cancel: Option<&CancellationToken>,
) -> Result<T, DispatchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, DispatchError>>,
{
    retry_if(action, policy, cancel, |_| true, |_, _| {}).await
}

/// Like [`execute_with_retry`], retrying only errors accepted by `should_retry`
///
/// `on_retry(next_attempt, &error)` runs before each wait.
pub async fn retry_if<T, F, Fut, P, N>(
    mut action: F,
    policy: RetryPolicy,
    cancel: Option<&CancellationToken>,
    should_retry: P,
    mut on_retry: N,
) -> Result<T, DispatchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, DispatchError>>,
    P: Fn(&DispatchError) -> bool,
    N: FnMut(u32, &DispatchError),
{
    if policy.max_attempts == 0 {
        return Err(DispatchError::configuration(
            "max_attempts must be at least 1",
        ));
    }

    let mut delays = FixedInterval::new(policy.delay).take(policy.max_attempts as usize - 1);
    let mut attempt = 1;

    loop {
        let error = match action(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !should_retry(&error) {
            return Err(error);
        }
        let Some(delay) = delays.next() else {
            warn!(attempts = attempt, "Giving up after final attempt: {}", error);
            return Err(error);
        };

        attempt += 1;
        debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying after: {}", error);
        on_retry(attempt, &error);

        match cancel {
            Some(token) => {
                tokio::select! {
                    () = token.cancelled() => return Err(DispatchError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
    }
}
