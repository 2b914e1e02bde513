// ABOUTME: Remote Unix socket access over SSH direct-streamlocal channels.
// ABOUTME: Bridges a private local socket to a remote socket, one channel per connection.

use super::client::TunnelHandler;
use super::error::{Error, Result};
use russh::ChannelStream;
use russh::client::{Handle, Msg};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle for a running socket forwarder.
pub struct ForwardHandle {
    /// Path to the local socket.
    pub local_path: PathBuf,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ForwardHandle {
    /// Stop accepting connections and remove the local socket.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take()
            && tokio::time::timeout(Duration::from_secs(2), task)
                .await
                .is_err()
        {
            tracing::debug!(path = ?self.local_path, "forwarder did not stop in time");
        }
        let _ = std::fs::remove_file(&self.local_path);
    }
}

impl Drop for ForwardHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        let _ = std::fs::remove_file(&self.local_path);
    }
}

pub(crate) async fn open_streamlocal(
    handle: &Handle<TunnelHandler>,
    remote_socket: &str,
) -> Result<ChannelStream<Msg>> {
    let channel = handle
        .channel_open_direct_streamlocal(remote_socket)
        .await
        .map_err(|e| {
            Error::SocketForwardFailed(format!(
                "failed to open streamlocal channel to {}: {}",
                remote_socket, e
            ))
        })?;
    Ok(channel.into_stream())
}

/// Bind a local socket readable only by the current user and start bridging
/// its connections to `remote_socket`.
pub(crate) async fn start_forward(
    handle: Arc<Handle<TunnelHandler>>,
    remote_socket: String,
) -> Result<ForwardHandle> {
    let local_path = generate_socket_path();
    let _ = std::fs::remove_file(&local_path);

    let listener = UnixListener::bind(&local_path).map_err(|e| {
        Error::SocketForwardFailed(format!(
            "failed to bind local socket {:?}: {}",
            local_path, e
        ))
    })?;
    // The socket grants control of the remote daemon.
    std::fs::set_permissions(&local_path, std::fs::Permissions::from_mode(0o600))?;

    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_forwarder(listener, handle, remote_socket, shutdown_rx));

    Ok(ForwardHandle {
        local_path,
        shutdown,
        task: Some(task),
    })
}

fn generate_socket_path() -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let count = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("burrow-{}-{}.sock", std::process::id(), count))
}

async fn run_forwarder(
    listener: UnixListener,
    handle: Arc<Handle<TunnelHandler>>,
    remote_socket: String,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let accepted = tokio::select! {
            result = listener.accept() => result,
            _ = shutdown.changed() => break,
        };

        match accepted {
            Ok((stream, _addr)) => {
                let handle = Arc::clone(&handle);
                let remote_socket = remote_socket.clone();
                tokio::spawn(async move {
                    if let Err(e) = forward_connection(stream, &handle, &remote_socket).await {
                        tracing::debug!("forwarded connection error: {}", e);
                    }
                });
            }
            Err(e) => {
                tracing::warn!("accept error on forwarded socket: {}", e);
                break;
            }
        }
    }
}

async fn forward_connection(
    mut local: UnixStream,
    handle: &Handle<TunnelHandler>,
    remote_socket: &str,
) -> Result<()> {
    let mut remote = open_streamlocal(handle, remote_socket).await?;
    let (sent, received) = tokio::io::copy_bidirectional(&mut local, &mut remote).await?;
    tracing::trace!(sent, received, "forwarded connection closed");
    Ok(())
}
