// ABOUTME: Command module aggregator for the burrow CLI.
// ABOUTME: Re-exports deploy, exec, and ps command handlers.

mod deploy;
mod exec;
mod ps;
mod session;

pub use deploy::deploy;
pub use exec::exec_command;
pub use ps::ps;
