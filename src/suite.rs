//! Scoped cluster fixtures for test code.
//!
//! [`ClusterSuite`] owns one cluster shared by many cases. Each case borrows
//! the cluster, runs under `catch_unwind`, and is reported as passed or failed.
//! [`ClusterSuite::finish`] destroys the cluster exactly once.
//!
//! ```ignore
//! let suite = ClusterSuite::start(K8sVersion::V1_30_10).await?;
//! let (a, b) = futures::join!(
//!     suite.case("kubeconfig exists", async |c: &Cluster| {
//!         assert!(c.kubeconfig_path().exists());
//!     }),
//!     suite.case("ingress port", async |c: &Cluster| {
//!         assert!(c.ingress_port() > 0);
//!     }),
//! );
//! suite.finish(&[a, b]).await?;
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::cluster::Cluster;
use crate::error::{Error, Result};
use crate::version::K8sVersion;

/// Result of one case run against a shared cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    pub name: String,
    /// Panic message when the case failed.
    pub failure: Option<String>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// A cluster shared read-only across the cases of one test suite.
#[derive(Debug)]
pub struct ClusterSuite {
    cluster: Cluster,
}

impl ClusterSuite {
    pub async fn start(version: K8sVersion) -> Result<Self> {
        Ok(Self::from_cluster(Cluster::new(version).await?))
    }

    pub fn from_cluster(cluster: Cluster) -> Self {
        Self { cluster }
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Run one case. A panic inside `body` is recorded, not propagated.
    pub async fn case<F>(&self, name: &str, body: F) -> CaseOutcome
    where
        F: AsyncFnOnce(&Cluster),
    {
        let result = AssertUnwindSafe(body(&self.cluster)).catch_unwind().await;
        let failure = match result {
            Ok(()) => {
                info!(case = %name, "Case passed");
                None
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(case = %name, "Case panicked: {}", message);
                Some(message)
            }
        };
        CaseOutcome {
            name: name.to_string(),
            failure,
        }
    }

    /// Destroy the cluster, then report failed cases.
    ///
    /// A destroy error takes precedence over case failures.
    pub async fn finish(self, outcomes: &[CaseOutcome]) -> Result<()> {
        self.cluster.destroy().await?;

        let failed: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.passed())
            .map(|o| o.name.clone())
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::CasesFailed(failed))
        }
    }
}

/// Create a cluster, run `body` against it, and destroy the cluster on every
/// exit path including a panic in `body`.
pub async fn with_cluster<T, F>(version: K8sVersion, body: F) -> Result<T>
where
    F: AsyncFnOnce(&Cluster) -> T,
{
    let cluster = Cluster::new(version).await?;
    run_guarded(cluster, body).await
}

/// Run `body` against an existing cluster, then destroy it.
pub async fn run_guarded<T, F>(cluster: Cluster, body: F) -> Result<T>
where
    F: AsyncFnOnce(&Cluster) -> T,
{
    let result = AssertUnwindSafe(body(&cluster)).catch_unwind().await;
    let destroyed = cluster.destroy().await;

    match result {
        Ok(value) => destroyed.map(|()| value),
        Err(payload) => {
            if let Err(e) = destroyed {
                warn!(error = %e, "Destroy after panic failed");
            }
            Err(Error::Panicked(panic_message(payload.as_ref())))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::fakes::*;

    fn engine() -> FakeRuntime {
        FakeRuntime::new(CreateBehavior::WriteKubeconfig(UNREACHABLE_KUBECONFIG))
    }

    fn deletes(runtime: &FakeRuntime) -> usize {
        runtime.calls().iter().filter(|c| c.starts_with("delete")).count()
    }

    #[test]
    fn test_panic_message_from_str_and_string() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(format!("pod {} not ready", "nginx"));
        assert_eq!(panic_message(payload.as_ref()), "pod nginx not ready");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_outcome_passed() {
        let ok = CaseOutcome {
            name: "a".into(),
            failure: None,
        };
        let bad = CaseOutcome {
            name: "b".into(),
            failure: Some("assertion failed".into()),
        };
        assert!(ok.passed());
        assert!(!bad.passed());
    }

    #[tokio::test]
    async fn test_cases_share_cluster_and_finish_destroys_once() {
        let parent = tempfile::tempdir().unwrap();
        let runtime = engine();
        let suite = ClusterSuite::from_cluster(fake_cluster(&runtime, parent.path()).await);

        let (good, bad) = futures::join!(
            suite.case("good", async |c: &Cluster| {
                assert_eq!(c.ingress_port(), FAKE_INGRESS_PORT);
                assert!(c.kubeconfig_path().is_file());
            }),
            suite.case("bad", async |c: &Cluster| {
                assert_eq!(c.ingress_port(), 0, "wrong port");
            }),
        );
        assert!(good.passed());
        assert!(bad.failure.as_deref().unwrap().contains("wrong port"));

        let err = suite.finish(&[good, bad]).await.unwrap_err();

        assert!(matches!(err, Error::CasesFailed(ref names) if names == &["bad".to_string()]));
        assert_eq!(deletes(&runtime), 1);
        assert_eq!(entries(parent.path()), 0);
    }

    #[tokio::test]
    async fn test_finish_with_passing_cases() {
        let parent = tempfile::tempdir().unwrap();
        let runtime = engine();
        let suite = ClusterSuite::from_cluster(fake_cluster(&runtime, parent.path()).await);

        let outcome = suite.case("port", async |c: &Cluster| assert!(c.ingress_port() > 0)).await;
        suite.finish(&[outcome]).await.unwrap();

        assert_eq!(deletes(&runtime), 1);
        assert_eq!(entries(parent.path()), 0);
    }

    #[tokio::test]
    async fn test_finish_reports_destroy_error_first() {
        let parent = tempfile::tempdir().unwrap();
        let mut runtime = engine();
        runtime.delete_fails = true;
        let suite = ClusterSuite::from_cluster(fake_cluster(&runtime, parent.path()).await);

        let bad = suite
            .case("bad", async |c: &Cluster| assert_eq!(c.ingress_port(), 0, "boom"))
            .await;
        let err = suite.finish(&[bad]).await.unwrap_err();

        assert!(matches!(err, Error::Runtime { operation: "delete", .. }));
    }

    #[tokio::test]
    async fn test_run_guarded_returns_body_value() {
        let parent = tempfile::tempdir().unwrap();
        let runtime = engine();
        let cluster = fake_cluster(&runtime, parent.path()).await;

        let port = run_guarded(cluster, async |c: &Cluster| c.ingress_port()).await.unwrap();

        assert_eq!(port, FAKE_INGRESS_PORT);
        assert_eq!(deletes(&runtime), 1);
        assert_eq!(entries(parent.path()), 0);
    }

    #[tokio::test]
    async fn test_run_guarded_destroys_after_panic() {
        let parent = tempfile::tempdir().unwrap();
        let runtime = engine();
        let cluster = fake_cluster(&runtime, parent.path()).await;

        let err = run_guarded(cluster, async |c: &Cluster| {
            assert_eq!(c.ingress_port(), 0, "assertion inside body");
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Panicked(ref m) if m.contains("assertion inside body")));
        assert_eq!(deletes(&runtime), 1);
        assert_eq!(entries(parent.path()), 0);
    }

    #[tokio::test]
    async fn test_run_guarded_surfaces_destroy_error() {
        let parent = tempfile::tempdir().unwrap();
        let mut runtime = engine();
        runtime.delete_fails = true;
        let cluster = fake_cluster(&runtime, parent.path()).await;

        let err = run_guarded(cluster, async |_c: &Cluster| ()).await.unwrap_err();

        assert!(matches!(err, Error::Runtime { operation: "delete", .. }));
        assert_eq!(entries(parent.path()), 1);
    }
}
