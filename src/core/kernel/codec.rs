use crate::core::errors::{DispatchError, ProtocolError};
use serde::de::DeserializeOwned;

/// Maximum characters of a raw body carried inside an error
pub const SNIPPET_LIMIT: usize = 256;

/// Codec trait turning a vendor response body into a typed result
///
/// Implementations must look for the vendor's business-error envelope before
/// attempting to parse the success shape.
pub trait ResponseCodec: Send + Sync + 'static {
    /// The typed success payload
    type Output: Send;

    fn decode(&self, body: &[u8]) -> Result<Self::Output, DispatchError>;
}

/// Lossy UTF-8 view of `body`, cut to [`SNIPPET_LIMIT`] characters
pub fn bounded_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut chars = text.chars();
    let mut snippet: String = chars.by_ref().take(SNIPPET_LIMIT).collect();
    if chars.next().is_some() {
        snippet.push_str("...");
    }
    snippet
}

/// Deserialize JSON, mapping failures to a parse error with a bounded snippet
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, DispatchError> {
    serde_json::from_slice(body).map_err(|e| {
        ProtocolError::Parse {
            message: e.to_string(),
            snippet: bounded_snippet(body),
        }
        .into()
    })
}
