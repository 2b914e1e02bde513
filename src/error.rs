// ABOUTME: Application-wide error types for burrow.
// ABOUTME: Classifies every failure into a kind that maps to a process exit code.

use crate::daemon::{CredentialError, DaemonError};
use crate::deploy::PipelineFailure;
use std::path::PathBuf;
use thiserror::Error;

/// Broad failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing configuration, or anything not classified below.
    Config,
    /// Tunnel, SSH, key, credential or daemon connection setup.
    Setup,
    /// A build, push or pull stream reported an error or broke off.
    Stream,
    /// Stopping or removing the previous container. Never fatal.
    Cleanup,
    /// Creating or starting the new container.
    Lifecycle,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Config | ErrorKind::Cleanup => 1,
            ErrorKind::Setup => 2,
            ErrorKind::Stream => 3,
            ErrorKind::Lifecycle => 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("SSH error: {0}")]
    Ssh(#[from] crate::ssh::Error),

    #[error("container daemon: {0}")]
    Daemon(#[from] DaemonError),

    #[error(transparent)]
    Deploy(#[from] PipelineFailure),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyExists(_)
            | Error::ConfigNotFound(_)
            | Error::InvalidConfig(_)
            | Error::Io(_)
            | Error::Yaml(_) => ErrorKind::Config,
            Error::Credentials(_) | Error::Ssh(_) | Error::Daemon(_) => ErrorKind::Setup,
            Error::Deploy(failure) => failure.error.kind(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
