use thiserror::Error;

/// Errors that can occur when talking to the search cluster.
#[derive(Debug, Error)]
pub enum ElasticError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unauthorized (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ElasticError {
    /// Whether retrying the same request with the same credentials is
    /// pointless.
    pub fn is_auth(&self) -> bool {
        matches!(self, ElasticError::Unauthorized { .. })
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ElasticError::Timeout
        } else {
            ElasticError::Connection(e.to_string())
        }
    }
}
