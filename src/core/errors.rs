use crate::core::config::ConfigError;
use crate::core::types::{RouteKey, TypesError};
use crate::core::validation::ValidationError;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failures of the HTTP exchange itself: the server answered, but not usefully
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("HTTP status {status}: {snippet}")]
    Status { status: u16, snippet: String },

    #[error("Response body is empty (HTTP {status})")]
    EmptyBody { status: u16 },

    #[error("Response body exceeds {limit} bytes (observed at least {observed})")]
    BodyTooLarge { limit: usize, observed: u64 },

    #[error("Failed to parse response: {message} (body: {snippet})")]
    Parse { message: String, snippet: String },
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid route: {0}")]
    InvalidRoute(#[from] TypesError),

    #[error("No sender registered for route {0}")]
    RouteNotFound(RouteKey),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        timeout: bool,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Business error: {code} - {message}")]
    Business {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{operation} via {channel} failed after {}ms: {source}", .elapsed.as_millis())]
    WithContext {
        operation: String,
        channel: String,
        elapsed: Duration,
        #[source]
        source: Box<DispatchError>,
    },
}

/// Coarse classification used for retry decisions and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Transport,
    Protocol,
    Business,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Business => "business",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

impl DispatchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn transport(message: impl Into<String>, timeout: bool) -> Self {
        Self::Transport {
            message: message.into(),
            timeout,
            source: None,
        }
    }

    pub fn business(
        code: impl Into<String>,
        message: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self::Business {
            code: code.into(),
            message: message.into(),
            request_id,
        }
    }

    /// Wrap with the operation, channel and elapsed time of the failing call
    pub fn context(self, operation: &str, channel: &str, elapsed: Duration) -> Self {
        Self::WithContext {
            operation: operation.to_string(),
            channel: channel.to_string(),
            elapsed,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through context wrappers
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::Configuration(_)
            | Self::Config(_)
            | Self::InvalidRoute(_)
            | Self::RouteNotFound(_)
            | Self::Signing(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Business { .. } => ErrorKind::Business,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::WithContext { source, .. } => source.kind(),
        }
    }

    /// Machine-readable code; vendor business codes pass through unmodified
    pub fn code(&self) -> Cow<'_, str> {
        match self.root() {
            Self::Configuration(_) | Self::Config(_) | Self::InvalidRoute(_) => {
                Cow::Borrowed("CONFIGURATION_ERROR")
            }
            Self::RouteNotFound(_) => Cow::Borrowed("ROUTE_NOT_FOUND"),
            Self::Validation(_) => Cow::Borrowed("VALIDATION_ERROR"),
            Self::Signing(_) => Cow::Borrowed("SIGNING_ERROR"),
            Self::Transport { timeout: true, .. } => Cow::Borrowed("TIMEOUT_ERROR"),
            Self::Transport { .. } => Cow::Borrowed("NETWORK_ERROR"),
            Self::Protocol(ProtocolError::Status { status, .. }) => {
                Cow::Owned(format!("HTTP_{}", status))
            }
            Self::Protocol(ProtocolError::EmptyBody { .. }) => Cow::Borrowed("EMPTY_BODY"),
            Self::Protocol(ProtocolError::BodyTooLarge { .. }) => Cow::Borrowed("BODY_TOO_LARGE"),
            Self::Protocol(ProtocolError::Parse { .. }) => Cow::Borrowed("PARSE_ERROR"),
            Self::Business { code, .. } => Cow::Borrowed(code.as_str()),
            Self::Cancelled => Cow::Borrowed("CANCELLED"),
            Self::WithContext { source, .. } => source.code(),
        }
    }

    /// Upstream request id, when the vendor reported one
    pub fn request_id(&self) -> Option<&str> {
        match self.root() {
            Self::Business { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self.root() {
            Self::Protocol(
                ProtocolError::Status { status, .. } | ProtocolError::EmptyBody { status },
            ) => Some(*status),
            Self::Transport {
                source: Some(source),
                ..
            } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Only transport failures are considered transient
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::Transport { timeout: true, .. })
    }

    pub fn is_http_error(&self) -> bool {
        matches!(self.root(), Self::Protocol(ProtocolError::Status { .. }))
    }

    /// Cloneable snapshot for lifecycle events
    pub fn summary(&self) -> ErrorSummary {
        ErrorSummary {
            kind: self.kind(),
            code: self.code().into_owned(),
            message: self.to_string(),
            request_id: self.request_id().map(str::to_string),
            http_status: self.http_status(),
            retryable: self.is_retryable(),
        }
    }
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
            timeout: err.is_timeout(),
            source: Some(err),
        }
    }
}

/// Owned, cloneable view of a `DispatchError`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
    pub http_status: Option<u16>,
    pub retryable: bool,
}
