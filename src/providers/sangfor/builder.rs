use crate::core::config::HttpPolicy;
use crate::core::errors::DispatchError;
use crate::core::kernel::{HttpExecutor, HttpExecutorBuilder, SignedRequest};
use crate::providers::sangfor::connector::SangforSmsSender;
use crate::providers::sangfor::types::{SangforSendRequest, SangforSmsConfig, SangforSmsMessage};
use std::sync::Arc;

/// Plain JSON POST to the configured gateway URL; the gateway takes no signature
pub fn build_request(
    config: &SangforSmsConfig,
    message: &SangforSmsMessage,
) -> Result<SignedRequest, DispatchError> {
    let payload = SangforSendRequest {
        account: &config.account,
        password: config.password(),
        msg: &message.content,
        phone: message.phones.join(","),
        report: if config.report { "true" } else { "false" },
    };
    let body = serde_json::to_vec(&payload)
        .map_err(|e| DispatchError::Signing(format!("failed to encode request body: {}", e)))?;

    Ok(SignedRequest::post(config.api_url.as_str())
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_body(body))
}

/// Create a Sangfor SMS sender over a shared executor
pub fn build_sender(executor: Arc<dyn HttpExecutor>) -> SangforSmsSender {
    SangforSmsSender::new(executor)
}

/// Create a Sangfor SMS sender with its own executor
pub fn build_sender_with_policy(policy: HttpPolicy) -> Result<SangforSmsSender, DispatchError> {
    let executor = HttpExecutorBuilder::new(policy).build()?;
    Ok(SangforSmsSender::new(Arc::new(executor)))
}
