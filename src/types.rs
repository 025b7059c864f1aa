use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
    pub fix_hint: Option<String>,
}

/// What `kubecheck up` reports about a running cluster.
#[derive(Debug, Serialize)]
pub struct ClusterInfo {
    pub name: String,
    pub kubeconfig: String,
    pub ingress_port: u16,
    pub server_version: String,
}
