//! Command-line interface definitions for the `proxyfleet` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, Subcommand};

/// Port the proxy service listens on when none is configured.
pub(crate) const DEFAULT_INSTANCE_PORT: u16 = 3128;

/// Top-level CLI for the `proxyfleet` binary.
#[derive(Debug, Parser)]
#[command(
    name = "proxyfleet",
    about = "Manage a fleet of forward-proxy instances on Google Compute Engine",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Port the proxy service listens on inside each instance.
    #[arg(
        long,
        global = true,
        env = "PROXYFLEET_INSTANCE_PORT",
        default_value_t = DEFAULT_INSTANCE_PORT,
        value_name = "PORT"
    )]
    pub(crate) instance_port: u16,
    /// Operation to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Subcommands of the `proxyfleet` binary.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List the managed instances and their lifecycle state.
    #[command(name = "list", about = "List managed instances")]
    List,
    /// Create a batch of new instances.
    #[command(name = "create", about = "Create a batch of new instances")]
    Create(CreateCommand),
    /// Start a stopped instance.
    #[command(name = "start", about = "Start a managed instance")]
    Start(InstanceCommand),
    /// Delete an instance.
    #[command(name = "remove", about = "Delete a managed instance")]
    Remove(InstanceCommand),
}

/// Arguments for the `proxyfleet create` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct CreateCommand {
    /// Number of instances to create.
    #[arg(value_name = "COUNT")]
    pub(crate) count: usize,
}

/// Arguments for subcommands that target a single instance.
#[derive(Debug, Parser)]
pub(crate) struct InstanceCommand {
    /// Instance name as shown by `proxyfleet list`.
    #[arg(value_name = "NAME")]
    pub(crate) name: String,
}
