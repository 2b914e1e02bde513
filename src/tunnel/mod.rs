// ABOUTME: Subprocess-backed duplex transport for reaching hosts behind a tunnel.
// ABOUTME: Turns a forwarding program's stdin/stdout into one byte stream.

//! The remote host is not routable from here. Instead a forwarding program
//! (for example `cloudflared access ssh --hostname <host>`) is spawned locally
//! and speaks to the host on our behalf. Whatever we write to its stdin reaches
//! the remote SSH server; whatever the server sends comes back on its stdout.
//!
//! [`TunnelChannel`] wraps that process as an `AsyncRead + AsyncWrite` stream
//! so it can be handed to the SSH client as its transport.

mod channel;
mod error;

pub use channel::{TunnelChannel, TunnelProcess};
pub use error::TunnelError;
