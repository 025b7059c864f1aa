mod check;
mod cli;
mod progress;
mod types;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use kubecheck::{Cluster, K8sVersion, config, runtime, sdk};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check => match check::run_check(cli.verbose) {
            Ok(true) => std::process::exit(0),
            Ok(false) => std::process::exit(1),
            Err(e) => {
                eprintln!("Error: {e:#}");
                std::process::exit(2);
            }
        },
        Commands::Up { release, json } => {
            let cfg = match load_config(cli.config.as_deref()) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error loading config: {e:#}");
                    std::process::exit(2);
                }
            };
            let version = release.unwrap_or_else(|| cfg.release.clone());
            match run_up(&cfg, version, json).await {
                Ok(()) => std::process::exit(0),
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    std::process::exit(2);
                }
            }
        }
        Commands::Id => {
            println!("{}", sdk::generate_unique_id());
        }
        Commands::Port => match sdk::free_port() {
            Ok(port) => println!("{port}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(2);
            }
        },
        Commands::BootstrapConfig { port } => {
            let rendered = port
                .map_or_else(sdk::free_port, Ok)
                .and_then(runtime::render_bootstrap_config);
            match rendered {
                Ok(doc) => print!("{doc}"),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(2);
                }
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit `--config` must exist; the default path is optional.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<config::Config> {
    match path {
        Some(p) => config::load_config(p),
        None => config::load_or_default(&config::default_config_path()),
    }
}

/// Provision a cluster, report it, and tear it down once the user interrupts.
async fn run_up(cfg: &config::Config, version: K8sVersion, json: bool) -> anyhow::Result<()> {
    let cluster = progress::staged(
        format!("Creating cluster ({version})"),
        Cluster::builder(version).config(cfg).create(),
    )
    .await
    .context("Failed to create cluster")?;

    let reported = report_and_wait(&cluster, json).await;

    let message = format!("Destroying cluster {}", cluster.name());
    let destroyed = progress::staged(message, cluster.destroy()).await;

    reported?;
    destroyed.context("Failed to destroy cluster")?;
    Ok(())
}

async fn report_and_wait(cluster: &Cluster, json: bool) -> anyhow::Result<()> {
    let server_version = cluster
        .server_version()
        .await
        .context("Failed to query API server version")?;

    let info = types::ClusterInfo {
        name: cluster.name().to_string(),
        kubeconfig: cluster.kubeconfig_path().display().to_string(),
        ingress_port: cluster.ingress_port(),
        server_version,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("\nCluster {} is ready:", info.name);
        println!("  server version: {}", info.server_version);
        println!("  ingress port:   {}", info.ingress_port);
        println!("  export KUBECONFIG={}", info.kubeconfig);
    }

    eprintln!("\nPress Ctrl-C to destroy the cluster.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    Ok(())
}
