//! Error types for cluster provisioning

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for kubecheck operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No host port could be bound
    #[error("failed to get a free port: {0}")]
    PortAllocation(#[source] std::io::Error),

    /// The temporary kubeconfig directory could not be created or removed
    #[error("kubeconfig slot {}: {source}", .path.display())]
    KubeconfigSlot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The kubeconfig manager already holds a slot
    #[error("kubeconfig slot already active at {}", .0.display())]
    SlotInUse(PathBuf),

    /// Bootstrap configuration could not be rendered
    #[error("failed to render bootstrap config: {0}")]
    Render(String),

    /// The cluster engine binary is missing
    #[error("cluster runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// The cluster engine reported a failure
    #[error("failed to {operation} cluster {cluster}: {message}")]
    Runtime {
        cluster: String,
        operation: &'static str,
        message: String,
    },

    /// The API client could not be built from the kubeconfig
    #[error("failed to build client from {}: {message}", .path.display())]
    Client { path: PathBuf, message: String },

    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Malformed Kubernetes release string
    #[error("invalid kubernetes release '{0}', expected <major>.<minor>.<patch>")]
    InvalidVersion(String),

    /// One or more suite cases failed
    #[error("{} case(s) failed: {}", .0.len(), .0.join(", "))]
    CasesFailed(Vec<String>),

    /// A guarded body panicked
    #[error("panicked: {0}")]
    Panicked(String),
}

impl Error {
    /// Create a runtime error for the given cluster and operation
    pub fn runtime(cluster: &str, operation: &'static str, message: impl Into<String>) -> Self {
        Self::Runtime {
            cluster: cluster.to_string(),
            operation,
            message: message.into(),
        }
    }

    /// Create a client construction error for the given kubeconfig path
    pub fn client(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Client {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
