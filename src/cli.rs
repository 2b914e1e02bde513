// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "burrow")]
#[command(about = "Build, push and run a container on a host reachable only through a tunnel")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (default: discover burrow.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a burrow.yml template into the current directory
    Init {
        /// Overwrite an existing burrow.yml
        #[arg(short, long)]
        force: bool,
    },

    /// Build, push, and replace the container on the remote host
    Deploy,

    /// Run a command on the remote host through the tunnel
    Exec {
        /// Command and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// List containers on the remote host
    Ps {
        /// Include stopped containers
        #[arg(short, long)]
        all: bool,
    },
}
