//! Error types for backend calls.

use thiserror::Error;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connection refused, reset, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Rate limited by the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body was not the expected JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl BackendError {
    /// Map a `reqwest` error, pulling timeouts out into their own variant.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Whether repeating the same request might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Http(e) => e.is_connect() || e.is_request(),
            Self::Parse(_) | Self::InvalidUrl(_) => false,
        }
    }

    /// Whether a failed write may still have been applied by the backend.
    ///
    /// Only a 4xx answer (other than 429) or a request that was never built
    /// proves nothing was stored.
    #[must_use]
    pub fn may_have_applied(&self) -> bool {
        match self {
            Self::Status { status, .. } => !(400..500).contains(status),
            Self::InvalidUrl(_) => false,
            Self::Http(_) | Self::Timeout | Self::RateLimited(_) | Self::Parse(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::RateLimited(5);
        assert_eq!(err.to_string(), "rate limited, retry after 5 seconds");

        let err = BackendError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned 502: bad gateway");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BackendError::Timeout.is_retryable());
        assert!(BackendError::RateLimited(1).is_retryable());
        assert!(
            BackendError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !BackendError::Status {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!BackendError::Parse("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_may_have_applied() {
        assert!(BackendError::Timeout.may_have_applied());
        assert!(BackendError::Parse("eof".to_string()).may_have_applied());
        assert!(
            BackendError::Status {
                status: 503,
                body: String::new()
            }
            .may_have_applied()
        );
        assert!(
            !BackendError::Status {
                status: 422,
                body: String::new()
            }
            .may_have_applied()
        );
    }
}
