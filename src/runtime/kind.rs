use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use super::{ClusterRuntime, render_bootstrap_config};
use crate::error::{Error, Result};
use crate::exec::{self, ExecResult};
use crate::sdk;

pub const DEFAULT_KIND_BINARY: &str = "kind";
pub const DEFAULT_NODE_IMAGE: &str = "kindest/node";
pub const DEFAULT_WAIT_FOR_READY: Duration = Duration::from_secs(5);

/// Source of host ports for the ingress mapping.
pub type PortAllocator = fn() -> Result<u16>;

/// Runtime backed by the `kind` CLI on Docker.
#[derive(Debug, Clone)]
pub struct KindRuntime {
    binary: String,
    node_image: String,
    wait_for_ready: Duration,
    allocate_port: PortAllocator,
}

impl KindRuntime {
    pub fn new() -> Self {
        Self {
            binary: DEFAULT_KIND_BINARY.to_string(),
            node_image: DEFAULT_NODE_IMAGE.to_string(),
            wait_for_ready: DEFAULT_WAIT_FOR_READY,
            allocate_port: sdk::free_port,
        }
    }

    /// Use a different `kind` executable (name on `PATH` or absolute path).
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Image repository the node image tag is appended to.
    pub fn node_image_repository(mut self, repository: impl Into<String>) -> Self {
        self.node_image = repository.into();
        self
    }

    pub fn wait_for_ready(mut self, wait: Duration) -> Self {
        self.wait_for_ready = wait;
        self
    }

    pub fn with_port_allocator(mut self, allocate_port: PortAllocator) -> Self {
        self.allocate_port = allocate_port;
        self
    }

    /// Node image for a release, e.g. `kindest/node:v1.30.10`.
    pub fn node_image(&self, release: &str) -> String {
        format!("{}:v{}", self.node_image, release)
    }

    fn create_args(&self, name: &str, release: &str, kubeconfig: &Path) -> Vec<String> {
        vec![
            "create".into(),
            "cluster".into(),
            "--name".into(),
            name.into(),
            "--image".into(),
            self.node_image(release),
            "--kubeconfig".into(),
            kubeconfig.to_string_lossy().into_owned(),
            "--wait".into(),
            format!("{}s", self.wait_for_ready.as_secs()),
            "--config".into(),
            "-".into(),
        ]
    }

    fn delete_args(name: &str, kubeconfig: &Path) -> Vec<String> {
        vec![
            "delete".into(),
            "cluster".into(),
            "--name".into(),
            name.into(),
            "--kubeconfig".into(),
            kubeconfig.to_string_lossy().into_owned(),
        ]
    }

    fn ensure_available(&self) -> Result<()> {
        which::which(&self.binary)
            .map(|_| ())
            .map_err(|e| Error::RuntimeUnavailable(format!("{}: {e}", self.binary)))
    }

    fn run(
        &self,
        name: &str,
        operation: &'static str,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<ExecResult> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        debug!(binary = %self.binary, args = %args.join(" "), "Running cluster engine");

        let result = exec::run_cmd_with_stdin(&self.binary, &args, stdin)
            .map_err(|e| Error::runtime(name, operation, format!("failed to execute {}: {e}", self.binary)))?;

        if !result.success() {
            return Err(Error::runtime(
                name,
                operation,
                format!("{} exited {}: {}", self.binary, result.exit_code, result.stderr.trim()),
            ));
        }
        Ok(result)
    }
}

impl Default for KindRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterRuntime for KindRuntime {
    fn create(&self, name: &str, release: &str, kubeconfig: &Path) -> Result<u16> {
        let port = (self.allocate_port)()?;

        info!("Generating cluster config file...");
        let config = render_bootstrap_config(port)?;

        self.ensure_available()?;

        let args = self.create_args(name, release, kubeconfig);
        let result = self.run(name, "create", &args, Some(config.as_bytes()))?;
        debug!(elapsed = ?result.duration, cluster = %name, "Cluster created");

        Ok(port)
    }

    fn delete(&self, name: &str, kubeconfig: &Path) -> Result<()> {
        self.ensure_available()?;

        let args = Self::delete_args(name, kubeconfig);
        self.run(name, "delete", &args, None)?;
        Ok(())
    }
}
