use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// File name of the kubeconfig inside a slot directory.
pub const KUBECONFIG_FILE: &str = "config";

/// Suffix marking temp directories created by kubecheck.
pub const DEFAULT_SUFFIX: &str = "-kubecheck";

/// Owns the on-disk location of one cluster's kubeconfig.
pub trait KubeconfigStore: Send + Sync {
    /// Reserve a fresh slot and return the kubeconfig path inside it. The file
    /// itself is written later by the cluster runtime.
    fn create_temp_kubeconfig(&mut self) -> Result<PathBuf>;

    /// Remove the slot and everything in it. Removing an absent slot is not an error.
    fn delete_temp_kubeconfig(&mut self) -> Result<()>;

    fn slot_dir(&self) -> Option<&Path>;
}

/// Kubeconfig slot backed by a uniquely named directory under the temp dir.
///
/// Dropping the store does not remove an active slot; only
/// `delete_temp_kubeconfig` does.
#[derive(Debug)]
pub struct TempKubeconfig {
    parent: PathBuf,
    suffix: String,
    slot: Option<PathBuf>,
}

impl TempKubeconfig {
    pub fn new() -> Self {
        Self::with_suffix(DEFAULT_SUFFIX)
    }

    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            parent: std::env::temp_dir(),
            suffix: suffix.into(),
            slot: None,
        }
    }

    /// Create slots under `parent` instead of the OS temp dir.
    pub fn in_dir(mut self, parent: impl Into<PathBuf>) -> Self {
        self.parent = parent.into();
        self
    }
}

impl Default for TempKubeconfig {
    fn default() -> Self {
        Self::new()
    }
}

impl KubeconfigStore for TempKubeconfig {
    fn create_temp_kubeconfig(&mut self) -> Result<PathBuf> {
        if let Some(dir) = &self.slot {
            return Err(Error::SlotInUse(dir.clone()));
        }

        info!("Creating temporary directory to persist the kubeconfig file");
        let dir = tempfile::Builder::new()
            .suffix(&self.suffix)
            .disable_cleanup(true)
            .tempdir_in(&self.parent)
            .map_err(|source| Error::KubeconfigSlot {
                path: self.parent.clone(),
                source,
            })?;

        let dir = dir.path().to_path_buf();
        let path = dir.join(KUBECONFIG_FILE);
        self.slot = Some(dir);
        Ok(path)
    }

    fn delete_temp_kubeconfig(&mut self) -> Result<()> {
        let Some(dir) = self.slot.take() else {
            debug!("No kubeconfig slot to delete");
            return Ok(());
        };

        info!(dir = %dir.display(), "Deleting temporary kubeconfig directory");
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::KubeconfigSlot { path: dir, source }),
        }
    }

    fn slot_dir(&self) -> Option<&Path> {
        self.slot.as_deref()
    }
}
