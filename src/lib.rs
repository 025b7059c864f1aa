//! Ephemeral single-node Kubernetes clusters for integration tests.
//!
//! [`Cluster::new`] allocates a free host port, creates a kind cluster with
//! that port mapped into its control-plane node, writes a kubeconfig to a
//! temporary directory and returns a handle with a ready [`kube::Client`].
//! [`Cluster::destroy`] deletes the cluster and the temporary directory.

pub mod cluster;
pub mod config;
pub mod error;
pub mod exec;
pub mod kubeconfig;
pub mod runtime;
pub mod sdk;
pub mod suite;
pub mod version;

pub use cluster::{Cluster, ClusterBuilder};
pub use error::{Error, Result};
pub use kubeconfig::{KubeconfigStore, TempKubeconfig};
pub use runtime::{BootstrapConfig, ClusterRuntime, KindRuntime};
pub use sdk::{free_port, generate_unique_id};
pub use suite::{CaseOutcome, ClusterSuite, run_guarded, with_cluster};
pub use version::K8sVersion;
