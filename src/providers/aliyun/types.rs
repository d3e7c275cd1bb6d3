use crate::core::config::ProviderCredentials;
use crate::core::validation::{require_len, require_non_blank, Validate, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ALIYUN_SMS_HOST: &str = "dysmsapi.aliyuncs.com";
pub const ALIYUN_SMS_VERSION: &str = "2017-05-25";
pub const ALIYUN_SEND_SMS_ACTION: &str = "SendSms";

/// Most numbers accepted in one `SendSms` call
pub const MAX_PHONE_COUNT: usize = 1000;

/// Which Aliyun signature scheme to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliyunSignatureVersion {
    /// `ACS3-HMAC-SHA256` in the `Authorization` header
    #[default]
    Acs3,
    /// Legacy RPC `HMAC-SHA1`, signature carried in the query
    Rpc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliyunSmsConfig {
    pub credentials: ProviderCredentials,
    pub sign_name: String,
    /// e.g. `cn-hangzhou`
    pub region_id: String,
    /// Overrides `https://dysmsapi.aliyuncs.com/`
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub signature_version: AliyunSignatureVersion,
}

impl AliyunSmsConfig {
    pub fn new(
        credentials: ProviderCredentials,
        sign_name: impl Into<String>,
        region_id: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            sign_name: sign_name.into(),
            region_id: region_id.into(),
            endpoint: None,
            signature_version: AliyunSignatureVersion::default(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub const fn with_signature_version(mut self, version: AliyunSignatureVersion) -> Self {
        self.signature_version = version;
        self
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}/", ALIYUN_SMS_HOST))
    }
}

impl Validate for AliyunSmsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.credentials.validate()?;
        require_non_blank("sign_name", &self.sign_name)?;
        require_non_blank("region_id", &self.region_id)
    }
}

/// One templated SMS to one or more numbers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliyunSmsMessage {
    pub template_code: String,
    pub phone_numbers: Vec<String>,
    /// Named template variables, sent as a JSON object
    #[serde(default)]
    pub template_param: BTreeMap<String, String>,
    /// Caller reference echoed back in delivery receipts
    #[serde(default)]
    pub out_id: Option<String>,
}

impl AliyunSmsMessage {
    pub fn new(template_code: impl Into<String>) -> Self {
        Self {
            template_code: template_code.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn add_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone_numbers.push(phone.into());
        self
    }

    #[must_use]
    pub fn add_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.template_param.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_out_id(mut self, out_id: impl Into<String>) -> Self {
        self.out_id = Some(out_id.into());
        self
    }

    /// `PhoneNumbers` wire value
    pub fn joined_phone_numbers(&self) -> String {
        self.phone_numbers.join(",")
    }

    /// `TemplateParam` wire value, `None` when the template takes no variables
    pub fn template_param_json(&self) -> Option<String> {
        if self.template_param.is_empty() {
            return None;
        }
        serde_json::to_string(&self.template_param).ok()
    }
}

impl Validate for AliyunSmsMessage {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("template_code", &self.template_code)?;
        require_len("phone_numbers", &self.phone_numbers, MAX_PHONE_COUNT)?;
        for phone in &self.phone_numbers {
            require_non_blank("phone_numbers", phone)?;
            if phone.contains(',') {
                return Err(ValidationError::new(
                    "phone_numbers",
                    format!("must not contain a comma: {}", phone),
                ));
            }
        }
        Ok(())
    }
}

/// `SendSms` result; `Code` is `OK` on success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliyunSmsResponse {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
    #[serde(rename = "BizId", default)]
    pub biz_id: Option<String>,
}

impl AliyunSmsResponse {
    pub fn is_ok(&self) -> bool {
        self.code == "OK"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_param_json_is_key_sorted() {
        let message = AliyunSmsMessage::new("SMS_1")
            .add_param("product", "relay")
            .add_param("code", "1234");
        assert_eq!(
            message.template_param_json().unwrap(),
            r#"{"code":"1234","product":"relay"}"#
        );
        assert!(AliyunSmsMessage::new("SMS_1").template_param_json().is_none());
    }

    #[test]
    fn test_message_validation() {
        let message = AliyunSmsMessage::new("SMS_1");
        assert_eq!(message.validate().unwrap_err().field, "phone_numbers");

        let message = message.add_phone("13800000000").add_phone("13900000000");
        assert!(message.validate().is_ok());
        assert_eq!(message.joined_phone_numbers(), "13800000000,13900000000");

        let message = AliyunSmsMessage::new(" ").add_phone("13800000000");
        assert_eq!(message.validate().unwrap_err().field, "template_code");

        let message = AliyunSmsMessage::new("SMS_1").add_phone("138,139");
        assert!(message.validate().is_err());
    }

    #[test]
    fn test_signature_version_serde() {
        let json = r#"{"credentials":{"access_key_id":"id","access_key_secret":"secret"},
            "sign_name":"Acme","region_id":"cn-hangzhou","signature_version":"rpc"}"#;
        let config: AliyunSmsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.signature_version, AliyunSignatureVersion::Rpc);
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint(), "https://dysmsapi.aliyuncs.com/");
    }
}
