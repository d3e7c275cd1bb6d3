use crate::core::config::HttpPolicy;
use crate::core::errors::DispatchError;
use crate::core::kernel::rest::endpoint_parts;
use crate::core::kernel::signer::canonical_query;
use crate::core::kernel::{
    HttpExecutor, HttpExecutorBuilder, SignedRequest, Signer, SigningContext,
};
use crate::providers::aliyun::connector::AliyunSmsSender;
use crate::providers::aliyun::signer::{AliyunAcs3Signer, AliyunRpcSigner};
use crate::providers::aliyun::types::{
    AliyunSignatureVersion, AliyunSmsConfig, AliyunSmsMessage, ALIYUN_SEND_SMS_ACTION,
    ALIYUN_SMS_VERSION,
};
use std::sync::Arc;

const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Sign one `SendSms` call at `timestamp` with `nonce`
///
/// Action parameters travel in the query string and the body is empty, for
/// both signature versions.
pub fn build_request(
    config: &AliyunSmsConfig,
    message: &AliyunSmsMessage,
    timestamp: i64,
    nonce: &str,
) -> Result<SignedRequest, DispatchError> {
    let endpoint = config.endpoint();
    let (host, path) = endpoint_parts(&endpoint)?;

    let phone_numbers = message.joined_phone_numbers();
    let template_param = message.template_param_json();
    let mut params: Vec<(&str, &str)> = vec![
        ("PhoneNumbers", phone_numbers.as_str()),
        ("SignName", config.sign_name.as_str()),
        ("TemplateCode", message.template_code.as_str()),
    ];
    if let Some(template_param) = template_param.as_deref() {
        params.push(("TemplateParam", template_param));
    }
    if let Some(out_id) = message.out_id.as_deref() {
        params.push(("OutId", out_id));
    }

    let rpc = config.signature_version == AliyunSignatureVersion::Rpc;
    if rpc {
        params.push(("Format", "JSON"));
        params.push(("RegionId", config.region_id.as_str()));
    }

    let extra_headers = [
        ("content-type", CONTENT_TYPE),
        ("x-acs-region-id", config.region_id.as_str()),
    ];
    let ctx = SigningContext {
        method: "POST",
        host: &host,
        uri: &path,
        query: &params,
        headers: if rpc { &[] } else { &extra_headers },
        action: ALIYUN_SEND_SMS_ACTION,
        version: ALIYUN_SMS_VERSION,
        timestamp,
        nonce,
        ..SigningContext::default()
    };

    let (headers, query) = if rpc {
        let (mut headers, signed) =
            AliyunRpcSigner::new(&config.credentials).sign_request(&ctx)?;
        headers.push(("content-type".to_string(), CONTENT_TYPE.to_string()));
        let pairs: Vec<(&str, &str)> = signed
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        (headers, canonical_query(&pairs))
    } else {
        let (headers, _) = AliyunAcs3Signer::new(&config.credentials).sign_request(&ctx)?;
        (headers, canonical_query(&params))
    };

    Ok(SignedRequest::post(format!("{}?{}", endpoint, query)).with_headers(headers))
}

/// Create an Aliyun SMS sender over a shared executor
pub fn build_sender(executor: Arc<dyn HttpExecutor>) -> AliyunSmsSender {
    AliyunSmsSender::new(executor)
}

/// Create an Aliyun SMS sender with its own executor
pub fn build_sender_with_policy(policy: HttpPolicy) -> Result<AliyunSmsSender, DispatchError> {
    let executor = HttpExecutorBuilder::new(policy).build()?;
    Ok(AliyunSmsSender::new(Arc::new(executor)))
}
