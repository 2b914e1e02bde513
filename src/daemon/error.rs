// ABOUTME: Errors from container daemon round trips.
// ABOUTME: Maps daemon HTTP status codes onto variants callers can match on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not modified: {0}")]
    NotModified(String),

    #[error("cannot reach container daemon: {0}")]
    Connection(String),

    #[error("failed to pack build context {path}: {source}")]
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("daemon error: {0}")]
    Api(String),
}

impl DaemonError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DaemonError::NotFound(_))
    }

    pub fn is_not_modified(&self) -> bool {
        matches!(self, DaemonError::NotModified(_))
    }
}

impl From<bollard::errors::Error> for DaemonError {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => DaemonError::NotFound(message),
            bollard::errors::Error::DockerResponseServerError {
                status_code: 409,
                message,
            } => DaemonError::Conflict(message),
            bollard::errors::Error::DockerResponseServerError {
                status_code: 304,
                message,
            } => DaemonError::NotModified(message),
            other => DaemonError::Api(other.to_string()),
        }
    }
}
