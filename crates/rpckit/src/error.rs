//! Error types for RPC operations.
//!
//! Every failure the remote side can produce maps to one [`Error`] variant.
//! Nothing in this crate retries: callers abort the whole invocation and
//! surface the message.

use serde_json::Value;
use std::fmt;

/// Result type alias for RPC operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of RPC errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Channel-level failure (status code, connection, TLS).
    Transport,
    /// Request/response correlation broken.
    Protocol,
    /// The server rejected the call.
    Api,
    /// Server product or version not supported.
    Server,
    /// A referenced object does not exist.
    NotFound,
    /// The server answered with something we cannot interpret.
    Format,
}

impl ErrorCategory {
    /// Whether an operation failing with this category may be retried.
    ///
    /// Always false: the caller must re-invoke the whole run.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Could not reach the server",
            Self::Protocol => "Response did not match the request",
            Self::Api => "The server rejected the call",
            Self::Server => "Unsupported server",
            Self::NotFound => "Object not found",
            Self::Format => "Unexpected server response",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check the API URL, network access and TLS settings",
            Self::Protocol => "Check for proxies rewriting API traffic",
            Self::Api => "Check the API key permissions and the requested values",
            Self::Server => "Upgrade the server or point at a supported product",
            Self::NotFound => "Create the object first or fix its name",
            Self::Format => "Check that the URL points at the JSON-RPC endpoint",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-success status or connection failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Response id does not echo the request id.
    #[error("response id {received} does not match request id {sent}")]
    Protocol {
        /// Id we sent.
        sent: String,
        /// Id the server returned.
        received: String,
    },

    /// The server returned a non-null `error` field.
    #[error("API error: {}", render_api_error(.0))]
    Api(Value),

    /// Server identified but its version is below the supported floor.
    #[error("unsupported {product} version {version}, at least {minimum} is required")]
    UnsupportedServer {
        /// Product family name.
        product: String,
        /// Detected version.
        version: String,
        /// Minimum supported version.
        minimum: String,
    },

    /// Server info matched no known product family.
    #[error("unknown server: no known version marker in server info")]
    UnknownServer,

    /// Referenced object does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Object kind, e.g. "repository".
        kind: String,
        /// Object identifier.
        id: String,
    },

    /// The response could not be interpreted.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

fn render_api_error(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Error {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Protocol { .. } => ErrorCategory::Protocol,
            Error::Api(_) => ErrorCategory::Api,
            Error::UnsupportedServer { .. } | Error::UnknownServer => ErrorCategory::Server,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::InvalidResponse(_) => ErrorCategory::Format,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Transport {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::Transport {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
