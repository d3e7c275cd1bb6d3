use crate::core::config::HttpPolicy;
use crate::core::errors::DispatchError;
use crate::core::kernel::rest::endpoint_parts;
use crate::core::kernel::{
    HttpExecutor, HttpExecutorBuilder, SignedRequest, Signer, SigningContext,
};
use crate::providers::tencent::connector::TencentSmsSender;
use crate::providers::tencent::signer::TencentSigner;
use crate::providers::tencent::types::{
    TencentSendSmsRequest, TencentSmsConfig, TencentSmsMessage, TENCENT_SMS_SERVICE,
    TENCENT_SMS_VERSION,
};
use std::sync::Arc;

/// Serialise and sign one `SendSms` call at `timestamp`
pub fn build_request(
    config: &TencentSmsConfig,
    message: &TencentSmsMessage,
    timestamp: i64,
) -> Result<SignedRequest, DispatchError> {
    let endpoint = config.endpoint();
    let (host, path) = endpoint_parts(&endpoint)?;

    let payload = TencentSendSmsRequest {
        phone_number_set: &message.phone_numbers,
        sms_sdk_app_id: &config.sdk_app_id,
        template_id: &message.template_id,
        sign_name: &config.sign_name,
        template_param_set: &message.template_params,
        session_context: message.session_context.as_deref(),
    };
    let body = serde_json::to_vec(&payload)
        .map_err(|e| DispatchError::Signing(format!("failed to encode request body: {}", e)))?;

    let ctx = SigningContext {
        method: "POST",
        host: &host,
        uri: &path,
        body: &body,
        action: message.action.as_str(),
        version: TENCENT_SMS_VERSION,
        timestamp,
        ..SigningContext::default()
    };
    let (headers, _) =
        TencentSigner::new(&config.credentials, TENCENT_SMS_SERVICE).sign_request(&ctx)?;

    Ok(SignedRequest::post(endpoint)
        .with_headers(headers)
        .with_header("X-TC-Region", config.region.as_str())
        .with_body(body))
}

/// Create a Tencent SMS sender over a shared executor
pub fn build_sender(executor: Arc<dyn HttpExecutor>) -> TencentSmsSender {
    TencentSmsSender::new(executor)
}

/// Create a Tencent SMS sender with its own executor
pub fn build_sender_with_policy(policy: HttpPolicy) -> Result<TencentSmsSender, DispatchError> {
    let executor = HttpExecutorBuilder::new(policy).build()?;
    Ok(TencentSmsSender::new(Arc::new(executor)))
}
