use anyhow::Result;
use console::Style;

use kubecheck::exec::run_cmd_unchecked;

use crate::progress::Stage;
use crate::types::CheckResult;

struct ToolSpec {
    name: &'static str,
    version_args: &'static [&'static str],
    fix_hint: &'static str,
}

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "kind",
        version_args: &["version"],
        fix_hint: "Install kind: go install sigs.k8s.io/kind@latest",
    },
    ToolSpec {
        name: "docker",
        version_args: &["--version"],
        fix_hint: "Install Docker: https://docs.docker.com/get-docker/",
    },
    ToolSpec {
        name: "kubectl",
        version_args: &["version", "--client"],
        fix_hint: "Install kubectl: https://kubernetes.io/docs/tasks/tools/",
    },
];

pub fn run_check(_verbose: bool) -> Result<bool> {
    let mut results: Vec<CheckResult> = Vec::new();

    for tool in TOOLS {
        let stage = Stage::start(format!("Checking {}...", tool.name));
        let result = check_tool(tool);
        stage.finish(result.passed);
        results.push(result);
    }

    // Docker daemon check (kind needs a running engine, not just the client)
    {
        let stage = Stage::start("Checking docker daemon...");
        let result = match run_cmd_unchecked("docker", &["info", "--format", "{{.ServerVersion}}"]) {
            Ok(exec) if exec.success() => CheckResult {
                name: "docker daemon".to_string(),
                passed: true,
                detail: format!("server {}", exec.stdout.trim()),
                fix_hint: None,
            },
            _ => CheckResult {
                name: "docker daemon".to_string(),
                passed: false,
                detail: "Docker daemon not reachable".to_string(),
                fix_hint: Some("Start Docker and make sure the current user can reach its socket".to_string()),
            },
        };
        stage.finish(result.passed);
        results.push(result);
    }

    print_summary(&results);

    Ok(results.iter().all(|r| r.passed))
}

fn check_tool(tool: &ToolSpec) -> CheckResult {
    if which::which(tool.name).is_err() {
        return CheckResult {
            name: tool.name.to_string(),
            passed: false,
            detail: "Not found on PATH".to_string(),
            fix_hint: Some(tool.fix_hint.to_string()),
        };
    }

    match run_cmd_unchecked(tool.name, tool.version_args) {
        Ok(exec) if exec.success() => CheckResult {
            name: tool.name.to_string(),
            passed: true,
            detail: exec.stdout.lines().next().unwrap_or("").trim().to_string(),
            fix_hint: None,
        },
        _ => CheckResult {
            name: tool.name.to_string(),
            passed: false,
            detail: "Found on PATH but failed to get version".to_string(),
            fix_hint: Some(tool.fix_hint.to_string()),
        },
    }
}

fn print_summary(results: &[CheckResult]) {
    println!();
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();

    for r in results {
        if r.passed {
            println!("  {} {}: {}", green.apply_to("PASS"), r.name, r.detail);
        } else {
            println!("  {} {}: {}", red.apply_to("FAIL"), r.name, r.detail);
            if let Some(hint) = &r.fix_hint {
                println!("       hint: {hint}");
            }
        }
    }
    println!();
}
