use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Typed errors for the routing-token subsystem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("Invalid message type: {0}")]
    InvalidMessageType(String),
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),
    #[error("Invalid route key: {0}")]
    InvalidRouteKey(String),
}

/// Kind of outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Sms,
    Email,
    Push,
}

impl MessageType {
    pub const ALL: [Self; 3] = [Self::Sms, Self::Email, Self::Push];

    /// Canonical upper-case token used in route keys
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Email => "EMAIL",
            Self::Push => "PUSH",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| TypesError::InvalidMessageType(s.to_string()))
    }
}

/// Provider channel token, e.g. `TENCENT_SMS`
///
/// Always upper-case ASCII letters, digits and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Channel(Cow<'static, str>);

impl Channel {
    pub const TENCENT_SMS: Self = Self(Cow::Borrowed("TENCENT_SMS"));
    pub const ALI_SMS: Self = Self(Cow::Borrowed("ALI_SMS"));
    pub const SANGFOR_SMS: Self = Self(Cow::Borrowed("SANGFOR_SMS"));

    /// Create a channel token, normalising to upper case
    pub fn new(token: impl AsRef<str>) -> Result<Self, TypesError> {
        let raw = token.as_ref();
        let normalized = raw.trim().to_ascii_uppercase();

        if normalized.is_empty()
            || !normalized
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err(TypesError::InvalidChannel(raw.to_string()));
        }

        Ok(Self(Cow::Owned(normalized)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Channel {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Composite `TYPE:CHANNEL` key selecting exactly one provider adapter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
    pub message_type: MessageType,
    pub channel: Channel,
}

impl RouteKey {
    pub fn new(message_type: MessageType, channel: Channel) -> Self {
        Self {
            message_type,
            channel,
        }
    }

    /// Build from raw tokens, e.g. `("sms", "tencent_sms")`
    pub fn from_tokens(message_type: &str, channel: &str) -> Result<Self, TypesError> {
        Ok(Self::new(message_type.parse()?, Channel::new(channel)?))
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.message_type, self.channel)
    }
}

impl FromStr for RouteKey {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (message_type, channel) = s
            .split_once(':')
            .ok_or_else(|| TypesError::InvalidRouteKey(s.to_string()))?;
        Self::from_tokens(message_type, channel)
    }
}
