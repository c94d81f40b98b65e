//! Error taxonomy shared by every backend call and local validation.

use std::fmt;

use serde::Deserialize;

/// Categories of client errors so callers can react per cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Rejected locally before any network call
    Validation,
    /// HTTP 401/403, or a gated operation without a session
    Unauthorized,
    /// Any other non-2xx response
    HttpStatus,
    /// Connection, DNS or body read failure
    Transport,
    /// Response body did not match the expected shape
    Parse,
    /// Persisting or clearing the stored token failed
    Storage,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Validation => write!(f, "validation"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Storage => write!(f, "storage"),
        }
    }
}

/// Structured error with a kind and a human-readable message.
///
/// `Display` renders only the message; the kind and status exist for
/// branching and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    /// HTTP status, when the error came from a response
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    /// Wraps a persistence failure, keeping the full context chain.
    pub fn storage(err: &anyhow::Error) -> Self {
        Self::new(ApiErrorKind::Storage, format!("{err:#}"))
    }

    /// Builds the error for a non-2xx response.
    ///
    /// Uses the `error` field of a JSON body when present and non-empty,
    /// otherwise falls back to `HTTP error! status: <code>`.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message =
            error_message_from_body(body).unwrap_or_else(|| format!("HTTP error! status: {status}"));
        let kind = match status {
            401 | 403 => ApiErrorKind::Unauthorized,
            _ => ApiErrorKind::HttpStatus,
        };
        Self {
            kind,
            message,
            status: Some(status),
        }
    }

    /// Classifies a reqwest failure that happened before a status was read.
    pub fn transport(e: &reqwest::Error) -> Self {
        let message = if e.is_connect() {
            format!("Connection failed: {e}")
        } else if e.is_request() {
            format!("Request error: {e}")
        } else if e.is_body() || e.is_decode() {
            format!("Failed to read response: {e}")
        } else {
            format!("Network error: {e}")
        };
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ApiErrorKind::Validation
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for client operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

fn error_message_from_body(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}
