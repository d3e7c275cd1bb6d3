use crate::core::validation::{require_non_blank, Validate, ValidationError};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Opaque credential pair issued by a provider (secret id + secret key)
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub access_key_id: Secret<String>,
    pub access_key_secret: Secret<String>,
}

// Never expose secrets in serialization
impl Serialize for ProviderCredentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ProviderCredentials", 2)?;
        state.serialize_field("access_key_id", "[REDACTED]")?;
        state.serialize_field("access_key_secret", "[REDACTED]")?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ProviderCredentials {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ProviderCredentialsHelper {
            access_key_id: String,
            access_key_secret: String,
        }

        let helper = ProviderCredentialsHelper::deserialize(deserializer)?;
        Ok(Self::new(helper.access_key_id, helper.access_key_secret))
    }
}

impl ProviderCredentials {
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: Secret::new(access_key_id.into()),
            access_key_secret: Secret::new(access_key_secret.into()),
        }
    }

    /// Create credentials from environment variables
    ///
    /// Expected environment variables:
    /// - `{PROVIDER}_ACCESS_KEY_ID` (e.g., `TENCENT_ACCESS_KEY_ID`)
    /// - `{PROVIDER}_ACCESS_KEY_SECRET` (e.g., `TENCENT_ACCESS_KEY_SECRET`)
    pub fn from_env(provider_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = provider_prefix.to_uppercase();
        let id_var = format!("{}_ACCESS_KEY_ID", prefix);
        let secret_var = format!("{}_ACCESS_KEY_SECRET", prefix);

        let access_key_id =
            env::var(&id_var).map_err(|_| ConfigError::MissingEnvironmentVariable(id_var))?;
        let access_key_secret = env::var(&secret_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_var))?;

        Ok(Self::new(access_key_id, access_key_secret))
    }

    /// Load a `.env` file (if present) and then read the environment
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(provider_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(provider_prefix, ".env")
    }

    /// Same as [`Self::from_env_file`] with a custom file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        provider_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        load_env_file(env_file_path)?;
        Self::from_env(provider_prefix)
    }

    pub fn has_credentials(&self) -> bool {
        !self.access_key_id.expose_secret().is_empty()
            && !self.access_key_secret.expose_secret().is_empty()
    }

    /// Get the key id (use carefully - exposes secret)
    pub fn access_key_id(&self) -> &str {
        self.access_key_id.expose_secret()
    }

    /// Get the key secret (use carefully - exposes secret)
    pub fn access_key_secret(&self) -> &str {
        self.access_key_secret.expose_secret()
    }
}

impl Validate for ProviderCredentials {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("access_key_id", self.access_key_id())?;
        require_non_blank("access_key_secret", self.access_key_secret())
    }
}

#[cfg(feature = "env-file")]
fn load_env_file(path: &str) -> Result<(), ConfigError> {
    match dotenv::from_path(path) {
        Ok(()) => Ok(()),
        // A missing .env file is fine - fall back to system env vars
        Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConfigError::InvalidConfiguration(format!(
            "Failed to load .env file '{}': {}",
            path, e
        ))),
    }
}

/// Process-wide HTTP policy shared by every adapter
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Maximum idle time between reads of the response
    pub read_timeout: Duration,
    /// Bound on sending the request until response headers arrive
    pub write_timeout: Option<Duration>,
    /// Bound on the whole exchange, body included
    pub call_timeout: Option<Duration>,
    /// Headers added to every request unless the request sets them itself
    pub default_headers: BTreeMap<String, String>,
    /// Response size ceiling in bytes
    pub max_body_bytes: usize,
    /// Proxy URL applied to all schemes
    pub proxy: Option<String>,
    /// Extra PEM root certificate to trust
    pub ca_cert_pem: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(60),
            write_timeout: None,
            call_timeout: None,
            default_headers: BTreeMap::new(),
            max_body_bytes: 1024 * 1024,
            proxy: None,
            ca_cert_pem: None,
            user_agent: "RelayX/1.0".to_string(),
        }
    }
}

impl HttpPolicy {
    /// Build a policy from `RELAYX_HTTP_*` environment variables
    ///
    /// Recognised variables (all optional):
    /// - `RELAYX_HTTP_CONNECT_TIMEOUT_SECS`, `RELAYX_HTTP_READ_TIMEOUT_SECS`
    /// - `RELAYX_HTTP_WRITE_TIMEOUT_SECS`, `RELAYX_HTTP_CALL_TIMEOUT_SECS`
    /// - `RELAYX_HTTP_MAX_BODY_BYTES`
    /// - `RELAYX_HTTP_PROXY`, `RELAYX_HTTP_CA_CERT`, `RELAYX_HTTP_USER_AGENT`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut policy = Self::default();

        if let Some(secs) = parse_env::<u64>("RELAYX_HTTP_CONNECT_TIMEOUT_SECS")? {
            policy.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_env::<u64>("RELAYX_HTTP_READ_TIMEOUT_SECS")? {
            policy.read_timeout = Duration::from_secs(secs);
        }
        policy.write_timeout =
            parse_env::<u64>("RELAYX_HTTP_WRITE_TIMEOUT_SECS")?.map(Duration::from_secs);
        policy.call_timeout =
            parse_env::<u64>("RELAYX_HTTP_CALL_TIMEOUT_SECS")?.map(Duration::from_secs);
        if let Some(bytes) = parse_env::<usize>("RELAYX_HTTP_MAX_BODY_BYTES")? {
            policy.max_body_bytes = bytes;
        }
        policy.proxy = env::var("RELAYX_HTTP_PROXY").ok();
        policy.ca_cert_pem = env::var("RELAYX_HTTP_CA_CERT").ok().map(PathBuf::from);
        if let Ok(user_agent) = env::var("RELAYX_HTTP_USER_AGENT") {
            policy.user_agent = user_agent;
        }

        Ok(policy)
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    #[must_use]
    pub fn with_ca_cert_pem(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert_pem = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::InvalidConfiguration(format!("{} has an invalid value: {}", name, raw))
        }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
