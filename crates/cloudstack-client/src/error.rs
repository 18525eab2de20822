//! CloudStack client errors

use thiserror::Error;

/// Errors that can occur when interacting with the CloudStack API
#[derive(Debug, Error)]
pub enum CloudStackError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CloudStack API returned an error response
    #[error("CloudStack API error {code}: {text}")]
    Api { code: u16, text: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lookup matched nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client configuration is incomplete or malformed
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    /// An asynchronous job did not finish in time
    #[error("Async job {0} timed out")]
    JobTimeout(String),
}

impl CloudStackError {
    /// API error helper
    pub fn api(code: u16, text: impl Into<String>) -> Self {
        Self::Api {
            code,
            text: text.into(),
        }
    }

    /// The "No match found" error a by-name lookup reports when nothing matches.
    pub fn no_match(kind: &str, name: &str) -> Self {
        Self::NotFound(format!("No match found for {} {}", kind, name))
    }
}
