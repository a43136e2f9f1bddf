// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playbook loading and execution: parse a YAML document into a
//! `Playbook`, then run each step in order honoring its condition,
//! timeout, retry count, and `fail_fast` flag.

use crate::condition::evaluate;
use crate::model::{Playbook, PlaybookResult, PlaybookStep, StepResult};
use crate::template::interpolate;
use rn_core::RunnerError;
use rn_shell::run_shell_command;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Parse a YAML document into a `Playbook`. `name` and `steps[]` are
/// required; each step requires `name` and `command`, other fields
/// default. Malformed documents raise `PlaybookLoad` (carried as
/// `RunnerError::PlaybookExecution`, the closed error set's only
/// Playbook-tagged variant).
pub fn parse_playbook(yaml: &str) -> Result<Playbook, RunnerError> {
    let playbook: Playbook = serde_yaml::from_str(yaml)
        .map_err(|e| RunnerError::PlaybookExecution {
            message: format!("failed to parse playbook: {e}"),
        })?;
    if playbook.steps.is_empty() {
        return Err(RunnerError::PlaybookExecution {
            message: "playbook has no steps".to_string(),
        });
    }
    Ok(playbook)
}

/// Load a playbook from a file, falling back to `default_playbook` when
/// `path` is `None` or does not exist — parse failures of a file that
/// does exist still raise rather than silently falling back.
pub fn load_playbook_or_default(
    path: Option<&Path>,
    default_playbook: Playbook,
) -> Result<Playbook, RunnerError> {
    let Some(path) = path else {
        info!("no playbook path given, using default");
        return Ok(default_playbook);
    };
    if !path.exists() {
        warn!(path = %path.display(), "playbook file not found, using default");
        return Ok(default_playbook);
    }
    let text = std::fs::read_to_string(path).map_err(|e| RunnerError::PlaybookExecution {
        message: format!("failed to read playbook {}: {e}", path.display()),
    })?;
    parse_playbook(&text)
}

fn should_execute(step: &PlaybookStep, context: &HashMap<String, JsonValue>) -> bool {
    match &step.condition {
        None => true,
        Some(condition) => evaluate(condition, context),
    }
}

async fn execute_step(
    step: &PlaybookStep,
    context: &HashMap<String, JsonValue>,
    cwd: &Path,
) -> StepResult {
    let command = interpolate(&step.command, context);
    let timeout = Duration::from_secs(step.timeout_seconds);

    let mut last_stdout = String::new();
    let mut last_stderr = String::new();
    let mut last_exit_code = -1;
    let mut last_duration = 0.0;

    for attempt in 0..=step.retry_count {
        if attempt > 0 {
            info!(attempt, max = step.retry_count, step = %step.name, "retrying playbook step");
        }
        let started = Instant::now();
        match run_shell_command(&command, cwd, timeout, &step.name).await {
            Ok(output) => {
                last_duration = started.elapsed().as_secs_f64();
                last_stdout = output.stdout;
                last_stderr = output.stderr;
                last_exit_code = output.status_code.unwrap_or(-1);
                if output.success() {
                    return StepResult {
                        step_name: step.name.clone(),
                        command,
                        success: true,
                        skipped: false,
                        stdout: last_stdout,
                        stderr: last_stderr,
                        exit_code: last_exit_code,
                        duration_seconds: last_duration,
                        retry_count: attempt,
                    };
                }
            }
            Err(message) => {
                last_duration = started.elapsed().as_secs_f64();
                last_stderr = message;
            }
        }
        if attempt < step.retry_count {
            warn!(step = %step.name, attempt, "step failed, will retry");
        }
    }

    StepResult {
        step_name: step.name.clone(),
        command,
        success: false,
        skipped: false,
        stdout: last_stdout,
        stderr: last_stderr,
        exit_code: last_exit_code,
        duration_seconds: last_duration,
        retry_count: step.retry_count,
    }
}

/// Run every step of `playbook` in order against `context`, in `cwd`.
/// A step whose condition is false is recorded as `skipped=true` without
/// running. On a non-`fail_fast` failure, execution continues to the
/// next step; on a `fail_fast` failure, remaining steps are not run.
pub async fn execute_playbook(
    playbook: &Playbook,
    context: &HashMap<String, JsonValue>,
    cwd: &Path,
) -> PlaybookResult {
    let mut step_results = Vec::with_capacity(playbook.steps.len());

    for step in &playbook.steps {
        if !should_execute(step, context) {
            info!(step = %step.name, "skipping step, condition not met");
            step_results.push(StepResult {
                step_name: step.name.clone(),
                command: step.command.clone(),
                success: true,
                skipped: true,
                stdout: String::new(),
                stderr: String::new(),
                exit_code: 0,
                duration_seconds: 0.0,
                retry_count: 0,
            });
            continue;
        }

        let result = execute_step(step, context, cwd).await;
        if result.success {
            info!(step = %step.name, "step completed");
        } else {
            error!(step = %step.name, exit_code = result.exit_code, "step failed");
        }
        let stop = !result.success && step.fail_fast;
        step_results.push(result);
        if stop {
            warn!(step = %step.name, "fail_fast set, stopping playbook");
            break;
        }
    }

    let success = step_results.iter().all(|r| r.success);
    let total_duration_seconds = step_results.iter().map(|r| r.duration_seconds).sum();

    PlaybookResult {
        playbook_name: playbook.name.clone(),
        success,
        step_results,
        total_duration_seconds,
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
