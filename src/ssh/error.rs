// ABOUTME: SSH-specific error types.
// ABOUTME: Covers tunnel setup, handshake, authentication and command failures.

use crate::tunnel::TunnelError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("tunnel failed: {0}")]
    Tunnel(#[from] TunnelError),

    #[error("SSH handshake failed: {0}")]
    Connection(String),

    #[error("SSH handshake did not complete within {0:?}")]
    Timeout(Duration),

    #[error("authentication failed for user {user}")]
    AuthenticationFailed { user: String },

    #[error("failed to load key from {path}: {reason}")]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("command execution failed: {0}")]
    CommandFailed(String),

    #[error("remote command `{command}` exited with status {exit_code}: {stderr}")]
    NonZeroExit {
        command: String,
        exit_code: u32,
        stdout: String,
        stderr: String,
    },

    #[error("channel closed unexpectedly without exit status")]
    ChannelClosed,

    #[error("socket forwarding failed: {0}")]
    SocketForwardFailed(String),

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
