use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a command and return the result regardless of exit code.
pub fn run_cmd_unchecked(cmd: &str, args: &[&str]) -> std::io::Result<ExecResult> {
    run_cmd_with_stdin(cmd, args, None)
}

/// Run a command, optionally feeding `stdin`, and return the result regardless of exit code.
pub fn run_cmd_with_stdin(
    cmd: &str,
    args: &[&str],
    stdin: Option<&[u8]>,
) -> std::io::Result<ExecResult> {
    let start = Instant::now();
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input)?;
        // pipe dropped here so the child sees EOF
    }

    let output = child.wait_with_output()?;
    let duration = start.elapsed();

    Ok(ExecResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration,
    })
}
