// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step condition evaluation: bare booleans, a single comparison
//! (`<value> <op> <value>`), or a lone identifier coerced to boolean.
//! Malformed conditions fail open — the caller runs the step and logs a
//! warning rather than treating evaluation failure as a hard error.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
enum Resolved {
    Bool(bool),
    Num(f64),
    Str(String),
}

impl Resolved {
    fn as_bool(&self) -> bool {
        match self {
            Resolved::Bool(b) => *b,
            Resolved::Num(n) => *n != 0.0,
            Resolved::Str(s) => matches!(s.to_lowercase().as_str(), "true" | "yes" | "1"),
        }
    }
}

fn context_lookup(name: &str, context: &HashMap<String, JsonValue>) -> Option<Resolved> {
    context.get(name).map(|v| match v {
        JsonValue::Bool(b) => Resolved::Bool(*b),
        JsonValue::Number(n) => Resolved::Num(n.as_f64().unwrap_or(0.0)),
        JsonValue::String(s) => Resolved::Str(s.clone()),
        other => Resolved::Str(other.to_string()),
    })
}

/// Parse order: quoted string, `true`/`false`, integer, float, otherwise a
/// context variable name (left as a string if unresolved).
fn resolve_value(expr: &str, context: &HashMap<String, JsonValue>) -> Resolved {
    let expr = expr.trim();

    if expr.len() >= 2 {
        let bytes = expr.as_bytes();
        if (bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'')
        {
            return Resolved::Str(expr[1..expr.len() - 1].to_string());
        }
    }

    match expr.to_lowercase().as_str() {
        "true" => return Resolved::Bool(true),
        "false" => return Resolved::Bool(false),
        _ => {}
    }

    if let Ok(n) = expr.parse::<i64>() {
        return Resolved::Num(n as f64);
    }
    if let Ok(n) = expr.parse::<f64>() {
        return Resolved::Num(n);
    }

    if let Some(resolved) = context_lookup(expr, context) {
        return resolved;
    }

    warn!(variable = expr, "condition variable not found in context, treating as string");
    Resolved::Str(expr.to_string())
}

fn compare(op: &str, left: &Resolved, right: &Resolved) -> bool {
    let numeric = match (left, right) {
        (Resolved::Num(a), Resolved::Num(b)) => Some((*a, *b)),
        (Resolved::Str(a), Resolved::Str(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(a), Ok(b)) => Some((a, b)),
            _ => None,
        },
        _ => None,
    };

    if let Some((a, b)) = numeric {
        return match op {
            "==" => a == b,
            "!=" => a != b,
            "<=" => a <= b,
            ">=" => a >= b,
            "<" => a < b,
            ">" => a > b,
            _ => unreachable!("op limited to the table in evaluate"),
        };
    }

    let a = to_comparable_string(left);
    let b = to_comparable_string(right);
    match op {
        "==" => a == b,
        "!=" => a != b,
        "<=" => a <= b,
        ">=" => a >= b,
        "<" => a < b,
        ">" => a > b,
        _ => unreachable!("op limited to the table in evaluate"),
    }
}

fn to_comparable_string(value: &Resolved) -> String {
    match value {
        Resolved::Bool(b) => b.to_string(),
        Resolved::Num(n) => n.to_string(),
        Resolved::Str(s) => s.clone(),
    }
}

const OPERATORS: &[&str] = &["==", "!=", "<=", ">=", "<", ">"];

/// Evaluate a condition expression to a boolean. Never fails: malformed
/// conditions are the caller's concern (fail-open at the step layer).
pub fn evaluate(condition: &str, context: &HashMap<String, JsonValue>) -> bool {
    let condition = condition.trim();
    match condition.to_lowercase().as_str() {
        "true" => return true,
        "false" => return false,
        _ => {}
    }

    for op in OPERATORS {
        if let Some(idx) = condition.find(op) {
            let left = &condition[..idx];
            let right = &condition[idx + op.len()..];
            let left = resolve_value(left, context);
            let right = resolve_value(right, context);
            return compare(op, &left, &right);
        }
    }

    resolve_value(condition, context).as_bool()
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
