use thiserror::Error;

/// Errors emitted while fetching or decoding a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The endpoint answered with a non-2xx status.
    #[error("catalog endpoint returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
    /// The body was not a JSON array.
    #[error("malformed catalog body: {0}")]
    Decode(#[from] serde_json::Error),
    /// Reading a catalog file failed.
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Whether repeating the request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Status { status } => *status >= 500,
            Self::Decode(_) | Self::Io(_) => false,
        }
    }
}
