// ABOUTME: Shared helpers for opening and closing the tunneled SSH session.
// ABOUTME: Every command that touches the remote host goes through these.

use burrow::config::Config;
use burrow::diagnostics::{Diagnostics, Warning};
use burrow::error::Result;
use burrow::output::Output;
use burrow::ssh::Session;

/// Spawn the tunnel and log in to the remote host.
pub async fn open_session(config: &Config, output: &Output) -> Result<Session> {
    output.progress(&format!(
        "  → Connecting to {}@{} via {}...",
        config.remote.user, config.remote.host, config.remote.tunnel.head
    ));

    let session = Session::connect(config.remote.ssh_session_config()).await?;
    Ok(session)
}

/// Tear the session down. Failure is only worth a warning at this point.
pub async fn close_session(session: Session, config: &Config, diag: &mut Diagnostics) {
    if let Err(e) = session.disconnect().await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            config.remote.host, e
        )));
    }
}
