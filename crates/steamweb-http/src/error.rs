//! HTTP client error types
//!
//! These never reach callers of [`crate::WebBrowser`]; they describe why a
//! single attempt failed so the retry loop can decide whether to go again.

use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network request failed (connect, TLS, DNS, timeout or body read)
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid referer URL
    #[error("Invalid referer: {0}")]
    InvalidReferer(String),

    /// Form data could not be URL-encoded
    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    /// Invalid proxy configuration
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// HTTP error status
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Redirect received after the redirect budget ran out
    #[error("Redirect budget exhausted at {url} (HTTP {status})")]
    RedirectBudgetExhausted {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Redirect status without a usable Location header
    #[error("HTTP {status} without a usable Location header")]
    MissingLocation { status: reqwest::StatusCode },

    /// Body was empty where content was required
    #[error("Response body is empty")]
    EmptyBody,

    /// Body is not valid JSON for the requested type
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Body is not well-formed XML
    #[error("Malformed XML: {0}")]
    Xml(#[from] xmltree::ParseError),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),

    /// Process-wide transport tuning was already applied
    #[error("Transport tuning is already initialized")]
    AlreadyInitialized,
}

impl HttpError {
    /// Check if error is retryable
    ///
    /// Everything that happens on the wire or while decoding is worth another
    /// attempt, including 4xx/5xx. Malformed input built by the caller is not.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            HttpError::InvalidUrl(_)
                | HttpError::InvalidReferer(_)
                | HttpError::InvalidForm(_)
                | HttpError::InvalidProxy(_)
                | HttpError::BuildError(_)
                | HttpError::AlreadyInitialized
        )
    }

    /// Check if error came from decoding a received body
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            HttpError::Json(_) | HttpError::Xml(_) | HttpError::EmptyBody
        )
    }
}
