use thiserror::Error;

/// Errors returned by [`crate::FsaClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status. `message` is the server's
    /// `detail` field when it sent one, otherwise the numeric status code.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl ClientError {
    /// HTTP status of the failed response, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Deserialize { .. } | ClientError::InvalidBaseUrl { .. } => None,
        }
    }
}
