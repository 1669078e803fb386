//! Verifier client error types.

use crate::config::ConfigError;

/// Longest response-body excerpt carried in an error.
pub const BODY_EXCERPT_LIMIT: usize = 512;

/// Errors from verifier calls.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// Network-level failure that persisted through every retry.
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The verifier answered with a non-2xx status. Never retried.
    #[error("verifier {endpoint} returned {status}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The response body was not JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response was JSON but not in a shape this client understands.
    #[error("unexpected response from {endpoint}: {reason}")]
    UnexpectedBody { endpoint: String, reason: String },
    /// The caller's overall deadline expired before this verifier answered.
    #[error("verifier {verifier_url} did not answer before the deadline")]
    DeadlineExceeded { verifier_url: String },
    /// The task fetching from this verifier ended abnormally.
    #[error("fetch task for {verifier_url} failed: {reason}")]
    TaskFailed { verifier_url: String, reason: String },
    /// The verifier URL could not be used as a request base.
    #[error("invalid verifier URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl VerifierError {
    /// HTTP status for [`VerifierError::Http`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Cut a response body down to [`BODY_EXCERPT_LIMIT`] bytes on a char
/// boundary.
pub(crate) fn body_excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
