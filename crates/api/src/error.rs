//! The client-side error taxonomy.
//!
//! Mirrors the handling conventions of the views: a 401 tears the session
//! down, a 404 renders an empty state in place, other 4xx messages are
//! shown to the user verbatim, and transport failures offer a retry.

use reqwest::StatusCode;

/// Errors produced by endpoint wrappers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured base URL could not be parsed
    #[error("invalid base URL: {0}")]
    BaseUrl(String),
    /// No usable response was received
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The session token was missing or rejected (401)
    #[error("not authorised")]
    Unauthorized,
    /// The session is valid but lacks permission (403)
    #[error("forbidden")]
    Forbidden,
    /// The addressed entity does not exist (404)
    #[error("not found")]
    NotFound,
    /// The server rejected the request and said why; the message is
    /// suitable for showing to the user verbatim
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The server failed (5xx)
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// A 2xx response body did not match the expected shape
    #[error("failed to decode response body: {0}")]
    Decode(String),
    /// An attachment record matched none of the known field spellings.
    /// A data-integrity problem, surfaced loudly rather than defaulted.
    #[error("attachment record is malformed (keys present: {keys:?})")]
    MalformedAttachment { keys: Vec<String> },
}

impl ApiError {
    /// Maps a non-2xx status and optional server message onto the taxonomy.
    pub(crate) fn classify(status: StatusCode, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        });
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            s if s.is_client_error() => ApiError::Rejected {
                status: s.as_u16(),
                message,
            },
            s => ApiError::Server {
                status: s.as_u16(),
                message,
            },
        }
    }
}
