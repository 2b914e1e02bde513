// ABOUTME: Errors raised while consuming a progress stream.
// ABOUTME: Distinguishes daemon-reported failures from transport and decode failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    /// The daemon reported an error inside the stream.
    #[error("{0}")]
    Remote(String),

    #[error("malformed progress record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("progress stream ended in the middle of a record")]
    Truncated,

    #[error("progress stream failed: {0}")]
    Transport(String),

    #[error("I/O error reading progress stream: {0}")]
    Io(#[from] std::io::Error),
}
