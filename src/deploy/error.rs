// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers build, push, pull, cleanup, and container lifecycle failures.

use crate::daemon::{CredentialError, DaemonError};
use crate::error::ErrorKind;
use crate::progress::ProgressError;
use crate::types::{ImageId, ImageRef};

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The build request could not be sent.
    #[error("failed to submit build: {0}")]
    BuildSubmit(#[source] DaemonError),

    /// The build stream reported an error or broke off.
    #[error("build failed: {0}")]
    Build(#[source] ProgressError),

    /// The build stream ended without naming the image it produced.
    #[error("build finished without reporting an image id")]
    MissingImageId,

    #[error("failed to tag image {image} as {reference}: {source}")]
    Tag {
        image: ImageId,
        reference: ImageRef,
        source: DaemonError,
    },

    #[error("failed to load registry credentials: {0}")]
    Credentials(#[source] CredentialError),

    #[error("push failed: {0}")]
    Push(#[source] ProgressError),

    #[error("remote pull failed: {0}")]
    Pull(#[source] ProgressError),

    #[error("failed to stop old container: {0}")]
    Stop(#[source] DaemonError),

    #[error("failed to remove old container: {0}")]
    Remove(#[source] DaemonError),

    #[error("failed to create container: {0}")]
    Create(#[source] DaemonError),

    #[error("failed to start container: {0}")]
    Start(#[source] DaemonError),
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::BuildSubmit(_) | DeployError::Credentials(_) => ErrorKind::Setup,
            DeployError::Build(_)
            | DeployError::MissingImageId
            | DeployError::Tag { .. }
            | DeployError::Push(_)
            | DeployError::Pull(_) => ErrorKind::Stream,
            DeployError::Stop(_) | DeployError::Remove(_) => ErrorKind::Cleanup,
            DeployError::Create(_) | DeployError::Start(_) => ErrorKind::Lifecycle,
        }
    }
}
