use crate::core::config::ProviderCredentials;
use crate::core::validation::{require_len, require_non_blank, Validate, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TENCENT_SMS_HOST: &str = "sms.tencentcloudapi.com";
pub const TENCENT_SMS_SERVICE: &str = "sms";
pub const TENCENT_SMS_VERSION: &str = "2021-01-11";

/// Most numbers accepted in one `SendSms` call
pub const MAX_PHONE_COUNT: usize = 200;

/// Tencent Cloud SMS credentials and routing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TencentSmsConfig {
    pub credentials: ProviderCredentials,
    pub sdk_app_id: String,
    /// e.g. `ap-guangzhou`
    pub region: String,
    pub sign_name: String,
    /// Overrides `https://sms.tencentcloudapi.com/`
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl TencentSmsConfig {
    pub fn new(
        credentials: ProviderCredentials,
        sdk_app_id: impl Into<String>,
        region: impl Into<String>,
        sign_name: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            sdk_app_id: sdk_app_id.into(),
            region: region.into(),
            sign_name: sign_name.into(),
            endpoint: None,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}/", TENCENT_SMS_HOST))
    }
}

impl Validate for TencentSmsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.credentials.validate()?;
        require_non_blank("sdk_app_id", &self.sdk_app_id)?;
        require_non_blank("region", &self.region)?;
        require_non_blank("sign_name", &self.sign_name)
    }
}

/// API actions of the SMS product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TencentSmsAction {
    #[default]
    SendSms,
    PullSmsSendStatus,
    PullSmsReplyStatus,
    SendSmsIntl,
    PullSmsSendStatusIntl,
    PullSmsReplyStatusIntl,
}

impl TencentSmsAction {
    pub const ALL: [Self; 6] = [
        Self::SendSms,
        Self::PullSmsSendStatus,
        Self::PullSmsReplyStatus,
        Self::SendSmsIntl,
        Self::PullSmsSendStatusIntl,
        Self::PullSmsReplyStatusIntl,
    ];

    /// Actions whose request carries a `SendSms`-shaped body
    pub const fn is_send(self) -> bool {
        matches!(self, Self::SendSms | Self::SendSmsIntl)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SendSms => "SendSms",
            Self::PullSmsSendStatus => "PullSmsSendStatus",
            Self::PullSmsReplyStatus => "PullSmsReplyStatus",
            Self::SendSmsIntl => "SendSmsIntl",
            Self::PullSmsSendStatusIntl => "PullSmsSendStatusIntl",
            Self::PullSmsReplyStatusIntl => "PullSmsReplyStatusIntl",
        }
    }
}

impl fmt::Display for TencentSmsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TencentSmsAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ValidationError::new("action", format!("unknown action {}", s)))
    }
}

/// One SMS, possibly to many numbers, rendered from a console template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TencentSmsMessage {
    /// E.164 numbers, e.g. `+8613800138000`
    pub phone_numbers: Vec<String>,
    pub template_id: String,
    /// Ordered values for `{1}`, `{2}`, ...
    #[serde(default)]
    pub template_params: Vec<String>,
    #[serde(default)]
    pub action: TencentSmsAction,
    #[serde(default)]
    pub session_context: Option<String>,
}

impl TencentSmsMessage {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            ..Self::default()
        }
    }

    /// Add a number, prefixing bare 11-digit mainland numbers with `+86`
    pub fn add_phone(mut self, phone: &str) -> Result<Self, ValidationError> {
        self.phone_numbers.push(normalize_phone(phone)?);
        Ok(self)
    }

    #[must_use]
    pub fn add_param(mut self, value: impl Into<String>) -> Self {
        self.template_params.push(value.into());
        self
    }

    #[must_use]
    pub fn with_session_context(mut self, context: impl Into<String>) -> Self {
        self.session_context = Some(context.into());
        self
    }
}

impl Validate for TencentSmsMessage {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.action.is_send() {
            return Err(ValidationError::new(
                "action",
                format!("{} cannot be sent as a message", self.action),
            ));
        }
        require_len("phone_numbers", &self.phone_numbers, MAX_PHONE_COUNT)?;
        for phone in &self.phone_numbers {
            if !is_e164(phone) {
                return Err(ValidationError::new(
                    "phone_numbers",
                    format!("not an international number: {}", phone),
                ));
            }
        }
        require_non_blank("template_id", &self.template_id)
    }
}

/// Normalise a number to international form
///
/// Numbers starting with `+` pass through; 11-digit numbers get `+86`.
pub fn normalize_phone(phone: &str) -> Result<String, ValidationError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(ValidationError::new("phone_numbers", "must not be blank"));
    }
    if phone.starts_with('+') {
        return Ok(phone.to_string());
    }
    if phone.len() == 11 && phone.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(format!("+86{}", phone));
    }
    Err(ValidationError::new(
        "phone_numbers",
        format!("unrecognised number format: {}", phone),
    ))
}

// `+` followed by 8 to 19 digits
fn is_e164(phone: &str) -> bool {
    phone.strip_prefix('+').is_some_and(|digits| {
        (8..=19).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
    })
}

/// Wire body of `SendSms`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TencentSendSmsRequest<'a> {
    pub phone_number_set: &'a [String],
    pub sms_sdk_app_id: &'a str,
    pub template_id: &'a str,
    pub sign_name: &'a str,
    pub template_param_set: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_context: Option<&'a str>,
}

/// `{"Response": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct TencentEnvelope<T> {
    #[serde(rename = "Response")]
    pub response: T,
}

/// Error-probe view of the envelope body
#[derive(Debug, Clone, Deserialize)]
pub struct TencentErrorBody {
    #[serde(rename = "Error")]
    pub error: Option<TencentApiError>,
    #[serde(rename = "RequestId")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TencentApiError {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Successful `SendSms` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TencentSmsResponse {
    #[serde(rename = "SendStatusSet", default)]
    pub send_status_set: Vec<SendStatus>,
    #[serde(rename = "RequestId")]
    pub request_id: String,
}

impl TencentSmsResponse {
    /// Per-number results that did not report `Ok`
    pub fn failed(&self) -> impl Iterator<Item = &SendStatus> {
        self.send_status_set.iter().filter(|s| !s.is_ok())
    }

    pub fn all_ok(&self) -> bool {
        self.failed().next().is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendStatus {
    #[serde(rename = "SerialNo", default)]
    pub serial_no: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "Fee", default)]
    pub fee: u32,
    #[serde(rename = "SessionContext", default)]
    pub session_context: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "IsoCode", default)]
    pub iso_code: String,
}

impl SendStatus {
    pub fn is_ok(&self) -> bool {
        self.code.eq_ignore_ascii_case("Ok")
    }
}
