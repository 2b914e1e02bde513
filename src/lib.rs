// ABOUTME: Library root for burrow - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod daemon;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod progress;
pub mod ssh;
pub mod tunnel;
pub mod types;
