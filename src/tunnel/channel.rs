// ABOUTME: TunnelChannel wraps a spawned process's pipes as a duplex stream.
// ABOUTME: Close drops both pipes, kills the process and waits for it to exit.

use super::error::{MissingPipeSnafu, Result, SignalSnafu, SpawnSnafu, UnsupportedSnafu, WaitSnafu};
use nonempty::NonEmpty;
use snafu::{OptionExt, ResultExt};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

/// Shared handle to the tunnel subprocess.
///
/// The SSH layer takes ownership of the [`TunnelChannel`] itself, so the
/// session keeps one of these to terminate the process once the SSH
/// connection is gone. Termination happens at most once; later calls are
/// no-ops.
#[derive(Debug, Clone)]
pub struct TunnelProcess {
    child: Arc<Mutex<Option<Child>>>,
}

impl TunnelProcess {
    fn new(child: Child) -> Self {
        Self {
            child: Arc::new(Mutex::new(Some(child))),
        }
    }

    /// Kill the process and wait for it to exit.
    ///
    /// Returns `Ok(None)` if the process was already terminated through
    /// another handle.
    pub async fn terminate(&self) -> Result<Option<ExitStatus>> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(None);
        };

        match child.start_kill() {
            Ok(()) => {}
            // Already reaped: nothing left to signal, wait returns the status.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(source) => return Err(source).context(SignalSnafu),
        }

        let status = child.wait().await.context(WaitSnafu)?;
        tracing::debug!(%status, "tunnel process exited");
        Ok(Some(status))
    }

    /// Whether the process has already been terminated through some handle.
    pub async fn is_terminated(&self) -> bool {
        self.child.lock().await.is_none()
    }
}

/// A duplex byte stream backed by a tunnel subprocess.
///
/// Reads come from the process's stdout, writes go to its stdin. The process
/// is spawned with `kill_on_drop`, so dropping the channel without calling
/// [`TunnelChannel::close`] still kills it.
#[derive(Debug)]
pub struct TunnelChannel {
    program: String,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    process: TunnelProcess,
}

impl TunnelChannel {
    /// Spawn `command` with `host` appended as its final argument.
    ///
    /// stderr is inherited so the tunnel program's own messages (login
    /// prompts, connection errors) reach the terminal.
    pub fn open(command: &NonEmpty<String>, host: &str) -> Result<Self> {
        let program = command.head.clone();
        tracing::debug!(%program, args = ?command.tail, %host, "spawning tunnel");

        let mut child = Command::new(&program)
            .args(&command.tail)
            .arg(host)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .context(SpawnSnafu {
                program: program.clone(),
            })?;

        let stdin = child.stdin.take().context(MissingPipeSnafu {
            program: program.clone(),
            pipe: "stdin",
        })?;
        let stdout = child.stdout.take().context(MissingPipeSnafu {
            program: program.clone(),
            pipe: "stdout",
        })?;

        Ok(Self {
            program,
            stdin: Some(stdin),
            stdout: Some(stdout),
            process: TunnelProcess::new(child),
        })
    }

    /// Name of the spawned program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// A handle that can terminate the process after the channel is moved.
    pub fn process(&self) -> TunnelProcess {
        self.process.clone()
    }

    /// Close both pipes, then kill the process and wait for it to exit.
    ///
    /// Safe to call more than once. Pipes are released before the signal is
    /// sent, whatever the outcome of the termination.
    pub async fn close(&mut self) -> Result<Option<ExitStatus>> {
        drop(self.stdin.take());
        drop(self.stdout.take());
        self.process.terminate().await
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        UnsupportedSnafu {
            operation: "local_addr",
        }
        .fail()
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        UnsupportedSnafu {
            operation: "peer_addr",
        }
        .fail()
    }

    pub fn set_deadline(&mut self, _deadline: Option<Instant>) -> Result<()> {
        UnsupportedSnafu {
            operation: "set_deadline",
        }
        .fail()
    }

    pub fn set_read_deadline(&mut self, _deadline: Option<Instant>) -> Result<()> {
        UnsupportedSnafu {
            operation: "set_read_deadline",
        }
        .fail()
    }

    pub fn set_write_deadline(&mut self, _deadline: Option<Instant>) -> Result<()> {
        UnsupportedSnafu {
            operation: "set_write_deadline",
        }
        .fail()
    }
}

fn closed_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "tunnel channel is closed")
}

impl AsyncRead for TunnelChannel {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut().stdout.as_mut() {
            Some(stdout) => Pin::new(stdout).poll_read(cx, buf),
            // Closed channel reads as end of stream.
            None => Poll::Ready(Ok(())),
        }
    }
}

impl AsyncWrite for TunnelChannel {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut().stdin.as_mut() {
            Some(stdin) => Pin::new(stdin).poll_write(cx, buf),
            None => Poll::Ready(Err(closed_pipe())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut().stdin.as_mut() {
            Some(stdin) => Pin::new(stdin).poll_flush(cx),
            None => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let Some(stdin) = this.stdin.as_mut() else {
            return Poll::Ready(Ok(()));
        };
        let result = futures::ready!(Pin::new(stdin).poll_shutdown(cx));
        this.stdin = None;
        Poll::Ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tunnel::TunnelError;

    fn sh(script: &str) -> NonEmpty<String> {
        NonEmpty::from_vec(vec!["sh".to_string(), "-c".to_string(), script.to_string()])
            .unwrap()
    }

    #[tokio::test]
    async fn spawn_failure_names_the_program() {
        let command = NonEmpty::new("burrow-no-such-tunnel-binary".to_string());
        let err = TunnelChannel::open(&command, "example.com").unwrap_err();

        assert!(matches!(err, TunnelError::Spawn { ref program, .. } if program == "burrow-no-such-tunnel-binary"));
    }

    #[tokio::test]
    async fn addressing_and_deadlines_are_unsupported() {
        // The host is passed as $0 to `sh -c` and ignored.
        let mut channel = TunnelChannel::open(&sh("cat"), "host").unwrap();

        assert!(matches!(
            channel.local_addr(),
            Err(TunnelError::Unsupported { operation: "local_addr" })
        ));
        assert!(channel.peer_addr().is_err());
        assert!(channel.set_deadline(Some(Instant::now())).is_err());
        assert!(channel.set_read_deadline(None).is_err());
        assert!(channel.set_write_deadline(None).is_err());

        channel.close().await.unwrap();
    }

    #[tokio::test]
    async fn terminate_through_handle_then_close_is_noop() {
        let mut channel = TunnelChannel::open(&sh("cat"), "host").unwrap();
        let process = channel.process();

        assert!(process.terminate().await.unwrap().is_some());
        assert!(process.is_terminated().await);
        assert!(channel.close().await.unwrap().is_none());
    }
}
