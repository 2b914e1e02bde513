// ABOUTME: Remote host settings: where to tunnel to and how to log in.
// ABOUTME: Converts into the SSH session configuration.

use super::deserialize::deserialize_tunnel;
use crate::daemon::REMOTE_DOCKER_SOCKET;
use crate::ssh::{DEFAULT_CONNECT_TIMEOUT, SessionConfig, default_tunnel};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Host name handed to the tunnel program.
    pub host: String,
    pub user: String,
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,
    /// Tunnel program and arguments; the host is appended when spawned.
    #[serde(default = "default_tunnel", deserialize_with = "deserialize_tunnel")]
    pub tunnel: NonEmpty<String>,
    /// Daemon socket on the remote host.
    #[serde(default = "default_socket")]
    pub socket: String,
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
}

fn default_key_path() -> PathBuf {
    PathBuf::from("~/.ssh/id_ed25519")
}

fn default_socket() -> String {
    REMOTE_DOCKER_SOCKET.to_string()
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

impl RemoteConfig {
    pub fn ssh_session_config(&self) -> SessionConfig {
        SessionConfig::new(&self.host, &self.user, expand_home(&self.key_path))
            .tunnel(self.tunnel.clone())
            .connect_timeout(self.connect_timeout)
    }
}

/// Replace a leading `~` with `$HOME`. Paths without one pass through.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
