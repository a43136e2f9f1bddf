// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout-bounded subprocess execution shared by `rn-vcs` and
//! `rn-playbook` step execution. Runs a single pre-formed command string
//! through the platform shell; this is not a shell-grammar interpreter —
//! Playbook steps and VCS invocations are already fully formed commands,
//! not scripts needing parsing.

use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default per-call timeout for VCS subprocess invocations.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default per-call timeout for Playbook shell steps, overridable per step.
pub const PLAYBOOK_STEP_TIMEOUT: Duration = Duration::from_secs(600);

/// Ceiling on captured stdout/stderr per spec.md's "Subprocess streams"
/// design note: large outputs are truncated with a marker rather than
/// buffered without bound.
pub const MAX_CAPTURED_BYTES: usize = 10 * 1024 * 1024;

const TRUNCATION_MARKER: &str = "\n...[truncated]...\n";

/// Result of a timeout-bounded command invocation, with streams already
/// truncated to [`MAX_CAPTURED_BYTES`].
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }
}

fn truncate_stream(bytes: Vec<u8>) -> String {
    if bytes.len() <= MAX_CAPTURED_BYTES {
        return String::from_utf8_lossy(&bytes).into_owned();
    }
    let mut kept = String::from_utf8_lossy(&bytes[..MAX_CAPTURED_BYTES]).into_owned();
    kept.push_str(TRUNCATION_MARKER);
    kept
}

fn to_command_output(output: Output) -> CommandOutput {
    CommandOutput {
        status_code: output.status.code(),
        stdout: truncate_stream(output.stdout),
        stderr: truncate_stream(output.stderr),
    }
}

/// Run `program` with `args` in `cwd`, bounded by `timeout`. The child is
/// killed on timeout expiry (`tokio::process::Child`'s drop
/// implementation terminates it).
pub async fn run_with_timeout(
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
    description: &str,
) -> Result<CommandOutput, String> {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd).kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(to_command_output(output)),
        Ok(Err(io_err)) => Err(format!("{description} failed: {io_err}")),
        Err(_elapsed) => Err(format!(
            "{description} timed out after {}s",
            timeout.as_secs()
        )),
    }
}

/// Run a single pre-formed shell command string (as Playbook steps are)
/// through the platform shell, bounded by `timeout`.
pub async fn run_shell_command(
    command: &str,
    cwd: &Path,
    timeout: Duration,
    description: &str,
) -> Result<CommandOutput, String> {
    run_with_timeout("sh", &["-c", command], cwd, timeout, description).await
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
