use thiserror::Error;

/// Errors that can occur while loading a driver snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot URL could not be parsed.
    #[error("invalid snapshot url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The request could not be completed.
    #[error("snapshot request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Snapshot failed: {0}")]
    Status(u16),

    /// The response body is not a valid snapshot.
    #[error("snapshot response is not valid: {0}")]
    Parse(#[from] serde_json::Error),
}
