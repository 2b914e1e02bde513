// ABOUTME: SSH session over a tunnel subprocess using russh.
// ABOUTME: Handles handshake, key authentication, command execution and teardown.

use super::error::{Error, Result};
use crate::tunnel::{TunnelChannel, TunnelProcess};
use nonempty::NonEmpty;
use parking_lot::Mutex;
use russh::client::{self, Config, Handle, Msg};
use russh::keys::ssh_key::{self, HashAlg};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key};
use russh::{ChannelMsg, ChannelStream, Disconnect};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default handshake ceiling.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for establishing a tunneled SSH session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Host name handed to the tunnel program.
    pub host: String,
    /// Username for authentication.
    pub user: String,
    /// Private key used for public-key authentication.
    pub key_path: PathBuf,
    /// Tunnel program and its fixed arguments; the host is appended.
    pub tunnel: NonEmpty<String>,
    /// Upper bound on handshake plus authentication.
    pub connect_timeout: Duration,
}

impl SessionConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        key_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            key_path: key_path.into(),
            tunnel: default_tunnel(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn tunnel(mut self, tunnel: NonEmpty<String>) -> Self {
        self.tunnel = tunnel;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// `cloudflared access ssh --hostname`, the host goes last.
pub fn default_tunnel() -> NonEmpty<String> {
    NonEmpty {
        head: "cloudflared".to_string(),
        tail: vec![
            "access".to_string(),
            "ssh".to_string(),
            "--hostname".to_string(),
        ],
    }
}

/// Output from a remote command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: u32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// russh handler that accepts any host key. See the module docs.
pub(crate) struct TunnelHandler {
    host: String,
}

impl client::Handler for TunnelHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        tracing::warn!(
            host = %self.host,
            fingerprint = %server_public_key.fingerprint(HashAlg::Sha256),
            "accepting unverified host key, trusting the tunnel to authenticate the endpoint"
        );
        Ok(true)
    }
}

/// An established SSH session running over a tunnel process.
///
/// Owns the tunnel: [`Session::disconnect`] tears down forwarders, the SSH
/// connection and finally the tunnel process.
pub struct Session {
    config: SessionConfig,
    handle: Arc<Handle<TunnelHandler>>,
    tunnel: TunnelProcess,
    /// Active socket forwarders.
    forwarders: Mutex<Vec<super::forward::ForwardHandle>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

impl Session {
    /// Spawn the configured tunnel and establish a session through it.
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let channel = TunnelChannel::open(&config.tunnel, &config.host)?;
        Self::connect_tunneled(config, channel).await
    }

    /// Establish a session over an already spawned tunnel channel.
    ///
    /// On any failure the tunnel process is terminated before returning.
    pub async fn connect_tunneled(config: SessionConfig, channel: TunnelChannel) -> Result<Self> {
        let tunnel = channel.process();

        let result = match tokio::time::timeout(
            config.connect_timeout,
            Self::handshake(&config, channel),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(config.connect_timeout)),
        };

        match result {
            Ok(handle) => Ok(Self {
                config,
                handle: Arc::new(handle),
                tunnel,
                forwarders: Mutex::new(Vec::new()),
            }),
            Err(e) => {
                if let Err(term) = tunnel.terminate().await {
                    tracing::warn!("failed to stop tunnel after handshake error: {}", term);
                }
                Err(e)
            }
        }
    }

    async fn handshake(
        config: &SessionConfig,
        channel: TunnelChannel,
    ) -> Result<Handle<TunnelHandler>> {
        let key = load_secret_key(&config.key_path, None).map_err(|e| Error::KeyLoadFailed {
            path: config.key_path.clone(),
            reason: e.to_string(),
        })?;

        let russh_config = Config {
            // Builds and pulls can leave the connection idle for a long time.
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(15)),
            ..Default::default()
        };

        let handler = TunnelHandler {
            host: config.host.clone(),
        };

        let mut handle = client::connect_stream(Arc::new(russh_config), channel, handler)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .map_err(Error::Protocol)?
            .flatten();

        let auth = handle
            .authenticate_publickey(
                &config.user,
                PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
            )
            .await
            .map_err(Error::Protocol)?;

        if !auth.success() {
            return Err(Error::AuthenticationFailed {
                user: config.user.clone(),
            });
        }

        tracing::debug!(host = %config.host, user = %config.user, "SSH session established");
        Ok(handle)
    }

    /// Execute a command and collect its output, whatever its exit status.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::CommandFailed(format!("failed to exec command: {}", e)))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        let mut got_eof = false;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => stdout.extend_from_slice(&data),
                Some(ChannelMsg::ExtendedData { data, ext: 1 }) => {
                    stderr.extend_from_slice(&data)
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = Some(exit_status);
                    if got_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Eof) => {
                    got_eof = true;
                    if exit_code.is_some() {
                        break;
                    }
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            }
        }

        // No exit status means the channel died underneath the command.
        let exit_code = exit_code.ok_or(Error::ChannelClosed)?;

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Execute a command, treating a nonzero exit status as an error.
    pub async fn run(&self, command: &str) -> Result<CommandOutput> {
        let output = self.exec(command).await?;
        if !output.success() {
            return Err(Error::NonZeroExit {
                command: command.to_string(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Open a duplex stream to a Unix socket on the remote host.
    pub async fn open_streamlocal(&self, remote_socket: &str) -> Result<ChannelStream<Msg>> {
        super::forward::open_streamlocal(&self.handle, remote_socket).await
    }

    /// Expose a remote Unix socket as a local one.
    ///
    /// Every connection to the returned local path is carried over its own
    /// streamlocal channel. The forwarder lives until [`Session::disconnect`].
    pub async fn forward_socket(&self, remote_socket: &str) -> Result<PathBuf> {
        let forward_handle =
            super::forward::start_forward(Arc::clone(&self.handle), remote_socket.to_string())
                .await?;
        let path = forward_handle.local_path.clone();
        self.forwarders.lock().push(forward_handle);
        Ok(path)
    }

    /// Tear down forwarders, the SSH connection and the tunnel process.
    ///
    /// The tunnel is terminated even when the SSH disconnect fails; the
    /// first error encountered is returned.
    pub async fn disconnect(self) -> Result<()> {
        // Drain to a Vec so the lock is not held across await points.
        let forwarders: Vec<_> = self.forwarders.lock().drain(..).collect();
        for forwarder in forwarders {
            forwarder.stop().await;
        }

        let disconnected = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Protocol);

        let terminated = self.tunnel.terminate().await.map_err(Error::from);

        disconnected?;
        terminated?;
        Ok(())
    }
}
