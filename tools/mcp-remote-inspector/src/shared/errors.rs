use serde_json::Value;
use thiserror::Error;

/// Transport binding could not be built from the configured URL.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported url scheme '{scheme}' in '{url}'")]
    UnsupportedScheme { url: String, scheme: String },
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("handshake timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u128 },
    #[error("connection rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
#[error("tool discovery failed: {0}")]
pub struct DiscoveryError(pub String);

/// An invocation that errored instead of producing a result.
///
/// `detail` carries the structured error payload when the server sent one.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallFailure {
    pub message: String,
    pub detail: Option<Value>,
}

impl CallFailure {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn structured(message: impl Into<String>, detail: Value) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail),
        }
    }
}
