//! Error types for the Nimbus API client.
//!
//! Transport-level failures (DNS, connect, timeout) pass through as
//! [`Error::Transport`] without classification. Non-2xx responses are
//! captured as [`HttpFailure`] so callers can inspect the status without
//! re-parsing it at every call site.

use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A non-2xx HTTP response, captured with its status and raw body text.
///
/// The transport never retries these; callers decide how to react via the
/// classification predicates or by comparing [`HttpFailure::status`] directly.
#[derive(Debug, Clone)]
pub struct HttpFailure {
    status: StatusCode,
    body: String,
}

impl HttpFailure {
    pub(crate) fn new(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }

    /// The HTTP status code of the failed response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw response body, as received.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// True iff the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// True iff the server answered 400.
    pub fn is_bad_request(&self) -> bool {
        self.status == StatusCode::BAD_REQUEST
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // StatusCode renders as the full status line, e.g. "404 Not Found"
        write!(f, "{}: {}", self.status, self.body)
    }
}

/// Errors surfaced by the client.
///
/// The enum is `Clone` (inner source errors held behind `Arc`) so memoized
/// outcomes can be replayed verbatim on repeat lookups.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[error("{0}")]
    Http(HttpFailure),

    /// Network-level failure before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// A body that could not be serialized or decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    /// Gave up waiting for a rate-limit slot before the deadline.
    #[error("timed out waiting for a rate limit slot")]
    WaitTimeout,

    /// Invalid client configuration, rejected at construction.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The underlying HTTP failure, if this error is one.
    pub fn http(&self) -> Option<&HttpFailure> {
        match self {
            Error::Http(failure) => Some(failure),
            _ => None,
        }
    }

    /// True iff this is an HTTP 404 response.
    pub fn is_not_found(&self) -> bool {
        self.http().is_some_and(HttpFailure::is_not_found)
    }

    /// True iff this is an HTTP 400 response.
    pub fn is_bad_request(&self) -> bool {
        self.http().is_some_and(HttpFailure::is_bad_request)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_predicate() {
        let failure = HttpFailure::new(StatusCode::NOT_FOUND, "no such thing".into());
        assert!(failure.is_not_found());
        assert!(!failure.is_bad_request());
    }

    #[test]
    fn bad_request_predicate() {
        let failure = HttpFailure::new(StatusCode::BAD_REQUEST, "missing field".into());
        assert!(failure.is_bad_request());
        assert!(!failure.is_not_found());
    }

    #[test]
    fn display_includes_status_line_and_body() {
        let failure = HttpFailure::new(StatusCode::INTERNAL_SERVER_ERROR, "boom".into());
        let rendered = failure.to_string();
        assert!(rendered.contains("500 Internal Server Error"));
        assert!(rendered.contains("boom"));
    }

    #[test]
    fn error_predicates_delegate() {
        let err = Error::Http(HttpFailure::new(StatusCode::NOT_FOUND, String::new()));
        assert!(err.is_not_found());
        assert!(!err.is_bad_request());
        assert!(!Error::WaitTimeout.is_not_found());
    }
}
