use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while talking to the platform API.
///
/// SECURITY: Error messages must NEVER contain credentials or signatures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed (invalid access key or signature)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// API returned a non-success response. The body is kept verbatim so the
    /// common error body can be recovered from the message later.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response arrived but did not have the expected shape
    #[error("failed to decode {action} response: {message}")]
    Decode { action: String, message: String },

    /// Request could not be built from the given parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Return code carried by the error body, if the platform sent one.
    pub fn return_code(&self) -> Option<String> {
        common_error_body(&self.to_string()).map(|body| body.return_code)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }
}

/// The `returnCode`/`returnMessage` pair the platform embeds in error bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonErrorBody {
    pub return_code: String,
    pub return_message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawErrorBody {
    return_code: serde_json::Value,
    #[serde(default)]
    return_message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WrappedErrorBody {
    response_error: RawErrorBody,
}

/// Extracts the common error body from an error message.
///
/// The message may carry arbitrary text before the JSON body (for example
/// `API error (400): {"responseError": {...}}`). Both the wrapped
/// `responseError` shape and a bare object are accepted.
pub fn common_error_body(message: &str) -> Option<CommonErrorBody> {
    let start = message.find('{')?;
    let end = message.rfind('}')?;
    if end < start {
        return None;
    }
    let json = &message[start..=end];

    let raw = serde_json::from_str::<WrappedErrorBody>(json)
        .map(|wrapped| wrapped.response_error)
        .or_else(|_| serde_json::from_str::<RawErrorBody>(json))
        .ok()?;

    let return_code = match raw.return_code {
        serde_json::Value::String(code) => code,
        serde_json::Value::Number(code) => code.to_string(),
        _ => return None,
    };

    Some(CommonErrorBody {
        return_code,
        return_message: raw.return_message.unwrap_or_default(),
    })
}
