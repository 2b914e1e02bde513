// ABOUTME: SSH client for hosts reached through a tunnel subprocess.
// ABOUTME: Key-based auth, remote command execution and Unix socket forwarding.

//! # Host key policy
//!
//! Sessions accept whatever host key the server presents. The endpoint is
//! authenticated by the tunnel program (for example an access-controlled
//! Cloudflare tunnel), not by `known_hosts`. Anyone able to impersonate the
//! tunnel endpoint can therefore impersonate the host. Every accepted key is
//! logged with its fingerprint at `warn` level.

mod client;
mod error;
mod forward;

pub use client::{
    CommandOutput, DEFAULT_CONNECT_TIMEOUT, Session, SessionConfig, default_tunnel,
};
pub use error::{Error, Result};
pub use forward::ForwardHandle;
