//! Transport error types

use thiserror::Error;

/// Errors that can occur while sending one call
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Remote server returned status code: {0}")]
    RemoteStatus(u16),

    #[error("Can NOT resolve the content type of response")]
    UndecodableContent,

    #[error("Remote server not response: {0}")]
    NoResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("URL is missing")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransportError {
    /// HTTP status carried by this error, if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::RemoteStatus(status) => Some(*status),
            _ => None,
        }
    }

    /// Check if the request never produced a response
    pub fn is_no_response(&self) -> bool {
        matches!(self, TransportError::NoResponse(_))
    }
}
