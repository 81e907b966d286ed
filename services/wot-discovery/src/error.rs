//! Error types for the discovery service

/// Errors that can occur while discovering or loading Thing Descriptions
#[derive(Debug, thiserror::Error)]
pub enum WotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Unexpected content type: {content_type}")]
    ContentType { url: String, content_type: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid Thing Description: {0}")]
    InvalidTd(String),

    #[error("Failed to parse .well-known/wot response: {0}")]
    Parse(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Discovery cancelled")]
    Cancelled,

    #[error("Discovery service has been disposed")]
    Disposed,
}

/// Result type alias for discovery operations
pub type Result<T> = std::result::Result<T, WotError>;
