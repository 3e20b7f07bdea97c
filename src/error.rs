//! Error types for content fetching and formatting

use thiserror::Error;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to the content repository or shaping its documents.
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP request never produced a response.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The content API answered with a non-success status.
    #[error("Content API returned {status} for {url}")]
    Status { status: u16, url: String },

    /// A response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A document is missing a field the formatter requires.
    #[error("Malformed document '{document}': {reason}")]
    MalformedDocument { document: String, reason: String },

    /// A document of a type this site does not know how to render.
    #[error("Unexpected document type '{found}' for '{document}'")]
    UnexpectedDocumentType { document: String, found: String },

    /// A continuation cursor this client cannot follow.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// The content API exposes no master ref to query against.
    #[error("Content API has no master ref")]
    NoMasterRef,

    /// Client configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fixture file I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed document error.
    pub fn malformed(document: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            document: document.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
