use crate::core::validation::{require_len, require_non_blank, Validate, ValidationError};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, Serializer};

/// Most numbers accepted in one gateway call
pub const MAX_PHONE_COUNT: usize = 100;

/// Sangfor SMS gateway account
#[derive(Debug, Clone, Deserialize)]
pub struct SangforSmsConfig {
    /// Full gateway URL the JSON body is posted to
    pub api_url: String,
    pub account: String,
    pub password: Secret<String>,
    /// Ask the gateway for delivery receipts
    #[serde(default)]
    pub report: bool,
}

impl Serialize for SangforSmsConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("SangforSmsConfig", 4)?;
        state.serialize_field("api_url", &self.api_url)?;
        state.serialize_field("account", &self.account)?;
        state.serialize_field("password", "[REDACTED]")?;
        state.serialize_field("report", &self.report)?;
        state.end()
    }
}

impl SangforSmsConfig {
    pub fn new(
        api_url: impl Into<String>,
        account: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            account: account.into(),
            password: Secret::new(password.into()),
            report: false,
        }
    }

    #[must_use]
    pub const fn with_report(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl Validate for SangforSmsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("api_url", &self.api_url)?;
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ValidationError::new("api_url", "must be an http(s) URL"));
        }
        require_non_blank("account", &self.account)?;
        require_non_blank("password", self.password())
    }
}

/// Free-text SMS; the gateway applies no template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SangforSmsMessage {
    pub phones: Vec<String>,
    pub content: String,
}

impl SangforSmsMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            phones: Vec::new(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn add_phone(mut self, phone: impl Into<String>) -> Self {
        self.phones.push(phone.into());
        self
    }
}

impl Validate for SangforSmsMessage {
    fn validate(&self) -> Result<(), ValidationError> {
        require_len("phones", &self.phones, MAX_PHONE_COUNT)?;
        for phone in &self.phones {
            require_non_blank("phones", phone)?;
        }
        require_non_blank("content", &self.content)
    }
}

/// Gateway request body
#[derive(Debug, Clone, Serialize)]
pub struct SangforSendRequest<'a> {
    pub account: &'a str,
    pub password: &'a str,
    pub msg: &'a str,
    /// Comma-separated numbers
    pub phone: String,
    pub report: &'static str,
}

/// Gateway reply; `code` 0 is success
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SangforSmsResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization_redacts_password() {
        let config = SangforSmsConfig::new("https://sms.example.com/send", "acct", "hunter2");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("[REDACTED]"));
    }

    #[test]
    fn test_config_validation() {
        assert!(SangforSmsConfig::new("https://sms.example.com/send", "acct", "pw")
            .validate()
            .is_ok());
        let err = SangforSmsConfig::new("ftp://sms", "acct", "pw")
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "api_url");
        let err = SangforSmsConfig::new("https://sms", "acct", " ")
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "password");
    }

    #[test]
    fn test_message_validation() {
        let message = SangforSmsMessage::new("hello");
        assert_eq!(message.validate().unwrap_err().field, "phones");
        let message = message.add_phone("13800000000");
        assert!(message.validate().is_ok());
        let message = SangforSmsMessage::new("").add_phone("13800000000");
        assert_eq!(message.validate().unwrap_err().field, "content");
    }

    #[test]
    fn test_response_wire_names() {
        let response: SangforSmsResponse =
            serde_json::from_str(r#"{"code":0,"msg":"ok","requestId":"abc"}"#).unwrap();
        assert_eq!(response.request_id.as_deref(), Some("abc"));
    }
}
