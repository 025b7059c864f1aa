use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::kubeconfig::{DEFAULT_SUFFIX, TempKubeconfig};
use crate::runtime::KindRuntime;
use crate::runtime::kind::{DEFAULT_KIND_BINARY, DEFAULT_NODE_IMAGE};
use crate::version::K8sVersion;

pub const DEFAULT_NAME_PREFIX: &str = "k1";

/// Provisioning settings. Every key is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Cluster names are `<name_prefix>-<unique id>`.
    pub name_prefix: String,
    pub kind_binary: String,
    /// Node image repository; the tag is `v<release>`.
    pub node_image: String,
    pub wait_for_ready_secs: u64,
    /// Suffix of the temp directory holding each kubeconfig.
    pub kubeconfig_suffix: String,
    /// Release used when none is given on the command line.
    pub release: K8sVersion,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            kind_binary: DEFAULT_KIND_BINARY.to_string(),
            node_image: DEFAULT_NODE_IMAGE.to_string(),
            wait_for_ready_secs: 5,
            kubeconfig_suffix: DEFAULT_SUFFIX.to_string(),
            release: K8sVersion::default(),
        }
    }
}

impl Config {
    pub fn kind_runtime(&self) -> KindRuntime {
        KindRuntime::new()
            .binary(&self.kind_binary)
            .node_image_repository(&self.node_image)
            .wait_for_ready(Duration::from_secs(self.wait_for_ready_secs))
    }

    pub fn kubeconfig_store(&self) -> TempKubeconfig {
        TempKubeconfig::with_suffix(&self.kubeconfig_suffix)
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file does not exist.
pub fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

/// Returns the default path to `kubecheck.toml` relative to the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("kubecheck.toml")
}
