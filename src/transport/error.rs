//! Error types for the transport layer.

/// Indicates that a frame received from a transport is not a valid stream message.
#[derive(Debug, thiserror::Error)]
#[error("malformed stream frame ({len} bytes): {source}")]
pub struct FrameError {
    pub len: usize,
    #[source]
    pub source: serde_json::Error,
}
