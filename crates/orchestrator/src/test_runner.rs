// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs the Test phase's command list: explicit `test_commands` from the
//! task, or an ecosystem-detected default. Not wired to `rn-playbook` —
//! that crate's step DAG is a different concern from "run the test suite
//! and report pass/fail per command".

use rn_core::{SingleTestResult, TestResult};
use rn_shell::PLAYBOOK_STEP_TIMEOUT;
use std::path::Path;

fn resolve_commands(workspace_path: &Path, explicit: Option<&[String]>) -> Vec<String> {
    if let Some(commands) = explicit {
        if !commands.is_empty() {
            return commands.to_vec();
        }
    }
    match crate::ecosystem::detect(workspace_path) {
        Some(kind) => vec![kind.default_test_command().to_string()],
        None => Vec::new(),
    }
}

/// Runs each command in order, stopping early on the first failure when
/// `fail_fast` is set. An empty command list (no explicit commands, no
/// ecosystem detected) is a successful no-op, not a failure — a Runner
/// should not fail a task just because it can't guess how to test it.
pub async fn run_tests(
    workspace_path: &Path,
    explicit_commands: Option<&[String]>,
    fail_fast: bool,
) -> TestResult {
    let started = std::time::Instant::now();
    let commands = resolve_commands(workspace_path, explicit_commands);

    if commands.is_empty() {
        tracing::warn!(
            workspace = %workspace_path.display(),
            "no test commands configured or detected; skipping test phase"
        );
        return TestResult {
            success: true,
            duration_seconds: started.elapsed().as_secs_f64(),
            results: Vec::new(),
            exit_code: 0,
        };
    }

    let mut results = Vec::with_capacity(commands.len());
    let mut exit_code = 0;
    for command in &commands {
        let outcome =
            rn_shell::run_shell_command(command, workspace_path, PLAYBOOK_STEP_TIMEOUT, command)
                .await;
        let (passed, message, code) = match &outcome {
            Ok(output) => (
                output.success(),
                (!output.success()).then(|| output.stderr.clone()),
                output.status_code.unwrap_or(1),
            ),
            Err(e) => (false, Some(e.clone()), 1),
        };
        if !passed {
            exit_code = code;
        }
        results.push(SingleTestResult {
            name: command.clone(),
            passed,
            message,
        });
        if !passed && fail_fast {
            break;
        }
    }

    let success = results.iter().all(|r| r.passed);
    TestResult {
        success,
        duration_seconds: started.elapsed().as_secs_f64(),
        results,
        exit_code,
    }
}

#[cfg(test)]
#[path = "test_runner_tests.rs"]
mod tests;
