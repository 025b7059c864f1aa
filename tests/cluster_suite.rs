//! One cluster shared by several concurrently running cases.
//!
//! Needs Docker and kind on the host:
//!
//! ```sh
//! cargo test --test cluster_suite -- --ignored --nocapture
//! ```

use std::time::Duration;

use k8s_openapi::api::core::v1::{Namespace, Pod, ServiceAccount};
use kube::Client;
use kube::api::{Api, PostParams};
use kubecheck::{Cluster, ClusterSuite, K8sVersion, generate_unique_id};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("kubecheck=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires docker and kind"]
async fn shared_cluster_suite() {
    init_logging();

    let suite = ClusterSuite::start(K8sVersion::V1_30_10)
        .await
        .expect("cluster should be created");

    let outcomes = futures::join!(
        suite.case("client reports requested version", async |c: &Cluster| {
            let got = c.server_version().await.expect("server version");
            assert_eq!(got, K8sVersion::V1_30_10.to_string());
        }),
        suite.case("kubeconfig exists while cluster is up", async |c: &Cluster| {
            assert!(c.kubeconfig_path().is_file(), "{} should exist", c.kubeconfig_path().display());
        }),
        suite.case("ingress port is a valid port", async |c: &Cluster| {
            assert!(c.ingress_port() > 0);
        }),
        suite.case("nginx pod is served on the ingress port", async |c: &Cluster| {
            nginx_pod_is_served(c).await
        }),
    );
    let outcomes = [outcomes.0, outcomes.1, outcomes.2, outcomes.3];

    let kubeconfig = suite.cluster().kubeconfig_path().to_path_buf();
    suite.finish(&outcomes).await.expect("all cases should pass");
    assert!(!kubeconfig.exists(), "kubeconfig should be removed after destroy");
}

async fn nginx_pod_is_served(c: &Cluster) {
    let id = generate_unique_id();
    let namespace = format!("test-namespace-{id}");
    let pod = test_pod("nginx", &namespace, &id, c.ingress_port());

    let created = create_pod(c.client(), &namespace, &pod).await.expect("pod should be created");
    assert_eq!(created.metadata.name, pod.metadata.name);

    let spec = created.spec.expect("pod spec");
    assert_eq!(spec.containers[0].image.as_deref(), Some("nginx"));
    let ports = spec.containers[0].ports.as_ref().expect("container ports");
    assert_eq!(ports[0].host_port, Some(i32::from(c.ingress_port())));

    let url = format!("http://localhost:{}/", c.ingress_port());
    let resp = retry_http_get(&url, 16, Duration::from_secs(5))
        .await
        .expect("nginx should answer");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

fn test_pod(image: &str, namespace: &str, id: &str, ingress_port: u16) -> Pod {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": format!("test-pod-{id}"),
            "namespace": namespace
        },
        "spec": {
            "containers": [{
                "name": format!("test-container-{id}"),
                "image": image,
                "ports": [{
                    "containerPort": 80,
                    "hostPort": ingress_port
                }]
            }]
        }
    }))
    .expect("valid pod")
}

async fn create_pod(client: &Client, namespace: &str, pod: &Pod) -> Result<Pod, kube::Error> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let ns = serde_json::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": { "name": namespace }
    }))
    .expect("valid namespace");
    namespaces.create(&PostParams::default(), &ns).await?;

    // The service account controller may not have created it yet.
    let accounts: Api<ServiceAccount> = Api::namespaced(client.clone(), namespace);
    let sa = serde_json::from_value(serde_json::json!({
        "apiVersion": "v1",
        "kind": "ServiceAccount",
        "metadata": { "name": "default" }
    }))
    .expect("valid service account");
    match accounts.create(&PostParams::default(), &sa).await {
        Ok(_) => {}
        Err(kube::Error::Api(ae)) if ae.code == 409 => {}
        Err(e) => return Err(e),
    }

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    pods.create(&PostParams::default(), pod).await
}

/// GET `url` up to `times` times, sleeping `wait` between connection failures.
async fn retry_http_get(url: &str, times: u32, wait: Duration) -> reqwest::Result<reqwest::Response> {
    let mut attempt = 1;
    loop {
        match reqwest::get(url).await {
            Ok(resp) => {
                eprintln!("GET {url} {}", resp.status());
                return Ok(resp);
            }
            Err(e) if attempt >= times => return Err(e),
            Err(e) => eprintln!("GET {url} attempt {attempt}/{times}: {e}"),
        }
        attempt += 1;
        tokio::time::sleep(wait).await;
    }
}
