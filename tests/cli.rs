use assert_cmd::Command;
use predicates::prelude::*;

fn kubecheck() -> Command {
    Command::cargo_bin("kubecheck").unwrap()
}

#[test]
fn help_lists_subcommands() {
    kubecheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("bootstrap-config"));
}

#[test]
fn id_prints_eight_lowercase_alphanumerics() {
    kubecheck()
        .arg("id")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[a-z0-9]{8}\n$").unwrap());
}

#[test]
fn port_prints_a_port_number() {
    let output = kubecheck().arg("port").output().unwrap();
    assert!(output.status.success());
    let port: u16 = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap();
    assert!(port > 0);
}

#[test]
fn bootstrap_config_embeds_port() {
    kubecheck()
        .args(["bootstrap-config", "--port", "31080"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: Cluster"))
        .stdout(predicate::str::contains("apiVersion: kind.x-k8s.io/v1alpha4"))
        .stdout(predicate::str::contains("role: control-plane"))
        .stdout(predicate::str::contains("containerPort: 31080"))
        .stdout(predicate::str::contains("hostPort: 31080"))
        .stdout(predicate::str::contains("protocol: TCP"));
}

#[test]
fn up_rejects_bad_release() {
    kubecheck()
        .args(["up", "--release", "latest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid kubernetes release"));
}

#[test]
fn up_with_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    kubecheck()
        .args(["up", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error loading config"));
}
