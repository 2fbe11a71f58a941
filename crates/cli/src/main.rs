//! Atlanta CLI
//!
//! Inspects a node, reads its hardware capabilities from the KubeVirt node
//! agent and prints the manifests that tune it for latency-sensitive VMs.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tuner_lib::ReservationPolicy;

use commands::node::NodeOptions;
use output::{print_error, LogFormat, OutputFormat};

/// Atlanta node configuration renderer
#[derive(Parser)]
#[command(name = "atlanta")]
#[command(author, version, about = "Atlanta helps getting the best performance out of KubeVirt VMs", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<String>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Namespace the node agent pods run in
    #[arg(long, short, global = true)]
    pub namespace: Option<String>,

    /// Output format for the rendered manifests
    #[arg(long, short, default_value = "yaml", global = true)]
    pub format: OutputFormat,

    /// Log format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render configuration objects for a specific node
    Node(NodeArgs),
}

#[derive(Args)]
pub struct NodeArgs {
    /// Node name
    #[arg(value_name = "NODE")]
    pub nodes: Vec<String>,

    /// Name of an SR-IOV device resource on the node (repeatable)
    #[arg(long = "sriov", value_name = "RESOURCE")]
    pub sriov: Vec<String>,

    /// NUMA cell whose CPUs are reserved for the system ("last" or an index)
    #[arg(long, value_name = "CELL")]
    pub reserve_cell: Option<ReservationPolicy>,

    /// Print a summary of the discovered topology and devices to stderr
    #[arg(long)]
    pub summary: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Node(ref args) => {
            let mut options = NodeOptions::complete(&cli, args)?;
            options.validate()?;
            options.run().await
        }
    }
}

/// Logs go to stderr so stdout carries only the manifests
fn init_tracing(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
