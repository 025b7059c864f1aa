//! Cluster runtime capability and the bootstrap document fed to it.

pub mod kind;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use kind::KindRuntime;

/// Engine that can create and delete a single-node cluster.
///
/// Both operations block until the engine finishes.
pub trait ClusterRuntime: Send + Sync {
    /// Create cluster `name` running `release`, writing credentials to
    /// `kubeconfig`. Returns the host port mapped into the control-plane node.
    fn create(&self, name: &str, release: &str, kubeconfig: &Path) -> Result<u16>;

    fn delete(&self, name: &str, kubeconfig: &Path) -> Result<()>;
}

pub const CLUSTER_KIND: &str = "Cluster";
pub const CLUSTER_API_VERSION: &str = "kind.x-k8s.io/v1alpha4";
pub const CONTROL_PLANE_ROLE: &str = "control-plane";

/// Topology handed to the engine: one control-plane node with one port mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    pub kind: String,
    pub api_version: String,
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub role: String,
    pub extra_port_mappings: Vec<PortMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
    pub protocol: String,
}

impl BootstrapConfig {
    /// Single control-plane node exposing `port` on the host and inside the node.
    pub fn single_node(port: u16) -> Self {
        Self {
            kind: CLUSTER_KIND.to_string(),
            api_version: CLUSTER_API_VERSION.to_string(),
            nodes: vec![NodeConfig {
                role: CONTROL_PLANE_ROLE.to_string(),
                extra_port_mappings: vec![PortMapping {
                    container_port: port,
                    host_port: port,
                    protocol: "TCP".to_string(),
                }],
            }],
        }
    }

    pub fn render(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Render(e.to_string()))
    }
}

/// Render the bootstrap document for a cluster whose ingress is `port`.
pub fn render_bootstrap_config(port: u16) -> Result<String> {
    BootstrapConfig::single_node(port).render()
}
