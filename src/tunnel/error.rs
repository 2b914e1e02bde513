// ABOUTME: Tunnel transport error types with SNAFU context selectors.
// ABOUTME: Spawn and pipe failures carry the program name for diagnostics.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TunnelError {
    #[snafu(display("failed to start tunnel program `{program}`: {source}"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("tunnel program `{program}` has no {pipe} pipe"))]
    MissingPipe { program: String, pipe: &'static str },

    #[snafu(display("failed to signal tunnel process: {source}"))]
    Signal { source: std::io::Error },

    #[snafu(display("failed waiting for tunnel process to exit: {source}"))]
    Wait { source: std::io::Error },

    #[snafu(display("{operation} is not supported on a process tunnel"))]
    Unsupported { operation: &'static str },
}

pub type Result<T> = std::result::Result<T, TunnelError>;
