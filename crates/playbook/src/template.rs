// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `${name}` variable substitution for step commands. Grounded on the
//! `${name}` half of the teacher's `VAR_PATTERN` interpolation (without
//! the shell-escaping/trusted-prefix variants, which belong to a
//! declarative-config renderer, not a fixed shell-command string).

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

static VAR_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("valid regex"));

fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace every `${name}` in `command` with `context[name]`'s string
/// form. Unresolved variables are left literal, with a warning.
pub fn interpolate(command: &str, context: &HashMap<String, JsonValue>) -> String {
    VAR_PATTERN
        .replace_all(command, |caps: &regex::Captures| {
            let name = &caps[1];
            match context.get(name) {
                Some(value) => stringify(value),
                None => {
                    warn!(variable = name, "template variable not found in context");
                    caps[0].to_string()
                }
            }
        })
        .to_string()
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
