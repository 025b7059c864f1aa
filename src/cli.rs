use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kubecheck::K8sVersion;

#[derive(Parser, Debug)]
#[command(
    name = "kubecheck",
    version,
    about = "Ephemeral single-node Kubernetes clusters for integration tests"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to ./kubecheck.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check tool prerequisites (kind, docker, kubectl)
    Check,

    /// Create a cluster, print its details, and destroy it on Ctrl-C
    Up {
        /// Kubernetes release to run (e.g. 1.30.10); defaults to the config file value
        #[arg(long, value_parser = parse_release)]
        release: Option<K8sVersion>,

        /// Print cluster details as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a random 8-character identifier
    Id,

    /// Print a TCP port that is currently free on this host
    Port,

    /// Print the cluster bootstrap configuration for an ingress port
    BootstrapConfig {
        /// Ingress port to map (a free port is picked when omitted)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
    },
}

fn parse_release(s: &str) -> Result<K8sVersion, String> {
    s.parse().map_err(|e: kubecheck::Error| e.to_string())
}
