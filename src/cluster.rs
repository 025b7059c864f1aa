//! Cluster lifecycle: provision a single-node cluster, hand out a client bound
//! to it, and tear everything down again.
//!
//! Setup is all-or-nothing. If any step after the kubeconfig slot is created
//! fails, the steps already taken are reversed before the error is returned,
//! so a failed [`Cluster::new`] leaves no container and no temp directory
//! behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KubeConfig};
use tracing::{info, warn};

use crate::config::{Config, DEFAULT_NAME_PREFIX};
use crate::error::{Error, Result};
use crate::kubeconfig::{KubeconfigStore, TempKubeconfig};
use crate::runtime::{ClusterRuntime, KindRuntime};
use crate::sdk;
use crate::version::K8sVersion;

/// A provisioned, reachable cluster.
///
/// Accessors are plain reads and may be used from many tasks at once.
/// [`Cluster::destroy`] consumes the handle.
pub struct Cluster {
    name: String,
    kubeconfig: PathBuf,
    ingress_port: u16,
    client: Client,
    runtime: Arc<dyn ClusterRuntime>,
    kubeconfig_store: Box<dyn KubeconfigStore>,
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.name)
            .field("kubeconfig", &self.kubeconfig)
            .field("ingress_port", &self.ingress_port)
            .finish_non_exhaustive()
    }
}

impl Cluster {
    /// Create a cluster running `version` with the default kind runtime.
    pub async fn new(version: K8sVersion) -> Result<Self> {
        Self::builder(version).create().await
    }

    pub fn builder(version: K8sVersion) -> ClusterBuilder {
        ClusterBuilder::new(version)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn kubeconfig_path(&self) -> &Path {
        &self.kubeconfig
    }

    /// Host port mapped into the control-plane node.
    pub fn ingress_port(&self) -> u16 {
        self.ingress_port
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The API server's reported version, e.g. `v1.30.10`.
    pub async fn server_version(&self) -> Result<String> {
        let info = self.client.apiserver_version().await?;
        Ok(info.git_version)
    }

    /// Delete the cluster, then its kubeconfig slot.
    ///
    /// If the engine fails to delete the cluster the error is returned and the
    /// kubeconfig is left on disk. A failure to remove the kubeconfig after a
    /// successful delete is only logged.
    pub async fn destroy(self) -> Result<()> {
        let Cluster {
            name,
            kubeconfig,
            runtime,
            mut kubeconfig_store,
            ..
        } = self;
        teardown(runtime, kubeconfig_store.as_mut(), &name, &kubeconfig).await
    }
}

/// Collaborators and settings for [`Cluster`] creation.
pub struct ClusterBuilder {
    version: K8sVersion,
    name_prefix: String,
    runtime: Arc<dyn ClusterRuntime>,
    kubeconfig_store: Box<dyn KubeconfigStore>,
}

impl ClusterBuilder {
    pub fn new(version: K8sVersion) -> Self {
        Self {
            version,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            runtime: Arc::new(KindRuntime::new()),
            kubeconfig_store: Box::new(TempKubeconfig::new()),
        }
    }

    /// Apply file-based settings: name prefix, kind runtime and kubeconfig suffix.
    pub fn config(self, config: &Config) -> Self {
        self.name_prefix(&config.name_prefix)
            .runtime(config.kind_runtime())
            .kubeconfig_store(config.kubeconfig_store())
    }

    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn runtime(mut self, runtime: impl ClusterRuntime + 'static) -> Self {
        self.runtime = Arc::new(runtime);
        self
    }

    pub fn kubeconfig_store(mut self, store: impl KubeconfigStore + 'static) -> Self {
        self.kubeconfig_store = Box::new(store);
        self
    }

    pub async fn create(self) -> Result<Cluster> {
        let ClusterBuilder {
            version,
            name_prefix,
            runtime,
            mut kubeconfig_store,
        } = self;

        let name = format!("{}-{}", name_prefix, sdk::generate_unique_id());

        info!("Creating single-node Kubernetes cluster...");
        info!(release = %version.release(), cluster = %name, "Kubernetes API server {}", version);

        let kubeconfig = kubeconfig_store.create_temp_kubeconfig()?;
        info!("KUBECONFIG={}", kubeconfig.display());

        let created = {
            let runtime = runtime.clone();
            let task_name = name.clone();
            let release = version.release().to_string();
            let path = kubeconfig.clone();
            blocking(&name, "create", move || runtime.create(&task_name, &release, &path)).await
        };
        let ingress_port = match created {
            Ok(port) => port,
            Err(e) => {
                discard_slot(kubeconfig_store.as_mut());
                return Err(e);
            }
        };
        info!(ingress_port, "Kubernetes ingress port {}", ingress_port);

        let client = match connect(&kubeconfig).await {
            Ok(client) => client,
            Err(e) => {
                warn!(cluster = %name, error = %e, "Client construction failed, rolling back cluster");
                if let Err(rollback) = runtime_delete(runtime, &name, &kubeconfig).await {
                    warn!(cluster = %name, error = %rollback, "Rollback delete failed");
                }
                discard_slot(kubeconfig_store.as_mut());
                return Err(e);
            }
        };

        Ok(Cluster {
            name,
            kubeconfig,
            ingress_port,
            client,
            runtime,
            kubeconfig_store,
        })
    }
}

/// Build a client from the kubeconfig file the runtime wrote.
pub async fn connect(kubeconfig: &Path) -> Result<Client> {
    let raw = Kubeconfig::read_from(kubeconfig)
        .map_err(|e| Error::client(kubeconfig, format!("failed to read kubeconfig: {e}")))?;
    let config = KubeConfig::from_custom_kubeconfig(raw, &KubeConfigOptions::default())
        .await
        .map_err(|e| Error::client(kubeconfig, format!("failed to load kubeconfig: {e}")))?;
    Client::try_from(config)
        .map_err(|e| Error::client(kubeconfig, format!("failed to create client: {e}")))
}

async fn teardown(
    runtime: Arc<dyn ClusterRuntime>,
    store: &mut dyn KubeconfigStore,
    name: &str,
    kubeconfig: &Path,
) -> Result<()> {
    info!(cluster = %name, "Deleting cluster {}-control-plane", name);
    runtime_delete(runtime, name, kubeconfig).await?;
    discard_slot(store);
    Ok(())
}

async fn runtime_delete(runtime: Arc<dyn ClusterRuntime>, name: &str, kubeconfig: &Path) -> Result<()> {
    let owned_name = name.to_string();
    let path = kubeconfig.to_path_buf();
    blocking(name, "delete", move || runtime.delete(&owned_name, &path)).await
}

fn discard_slot(store: &mut dyn KubeconfigStore) {
    if let Err(e) = store.delete_temp_kubeconfig() {
        warn!(error = %e, "Failed to delete temporary kubeconfig directory");
    }
}

/// Run engine work on the blocking pool.
async fn blocking<T, F>(name: &str, operation: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::runtime(name, operation, format!("engine task failed: {e}")))?
}
