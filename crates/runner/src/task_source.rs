// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reads the `TaskContext` a dispatcher handed this Runner process. The
//! dispatcher delivers the descriptor out of band (a file path, or `-`
//! for stdin); this crate's concern starts at "here is the JSON", not at
//! how the dispatcher chose this Runner for this task.

use rn_core::{RunnerError, TaskContext};
use std::io::Read;

/// Loads a `TaskContext` from `source`: the literal `-` reads a single
/// JSON document from stdin, anything else is a file path.
pub fn load_task_context(source: &str) -> Result<TaskContext, RunnerError> {
    let body = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| RunnerError::context_invalid(format!("failed to read stdin: {e}")))?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(|e| {
            RunnerError::context_invalid(format!("failed to read task context file {source}: {e}"))
        })?
    };

    serde_json::from_str(&body)
        .map_err(|e| RunnerError::context_invalid(format!("malformed task context JSON: {e}")))
}

#[cfg(test)]
#[path = "task_source_tests.rs"]
mod tests;
