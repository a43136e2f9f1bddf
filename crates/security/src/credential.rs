// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution and secret masking.
//!
//! `CredentialStore` resolves named credentials from the environment or a
//! file mount, remembers every value it has handed out in a mask set, and
//! scrubs that mask set from arbitrary text or structured output. Masking
//! must be applied uniformly by every emitter — this module only provides
//! the primitive.

use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Pattern-based redaction rules, compiled once. Order matters: more
/// specific patterns run first so a generic rule cannot swallow a match a
/// later specific rule would have labeled more precisely.
static REDACTION_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9\-_.=]+").expect("valid regex"),
            "Bearer ***",
        ),
        (
            Regex::new(r#"(?i)\b(api[_-]?key|token|password)\s*=\s*[^\s&"']+"#)
                .expect("valid regex"),
            "$1=***",
        ),
        (
            Regex::new(r"\bgh[pors]_[A-Za-z0-9]{36,}\b").expect("valid regex"),
            "gh*_***",
        ),
        (
            Regex::new(r"\bAKIA[0-9A-Z]{16}\b").expect("valid regex"),
            "***",
        ),
        (
            Regex::new(r#""[A-Za-z0-9+/]{40,}={0,2}""#).expect("valid regex"),
            "\"***\"",
        ),
    ]
});

/// Structured-key substrings that always force a value to `***` regardless
/// of content, per `MaskStructured`.
const SENSITIVE_KEY_MARKERS: &[&str] = &["token", "password", "secret", "key", "credential"];

#[derive(Default)]
pub struct CredentialStore {
    /// Resolved values, keyed by logical credential name.
    secrets: Mutex<HashMap<String, String>>,
    /// File-mount paths configured for a credential name, consulted when
    /// no environment variable is set.
    file_mounts: Mutex<HashMap<String, PathBuf>>,
    /// Every value ever resolved, used to mask future text. Grows
    /// monotonically until `clear()`.
    mask_set: Mutex<HashSet<String>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a file-mount path to fall back to for `name` when no
    /// environment variable resolves it.
    pub fn register_file_mount(&self, name: impl Into<String>, path: PathBuf) {
        self.file_mounts.lock().insert(name.into(), path);
    }

    /// Resolve order: (a) previously resolved value, (b) environment
    /// variable (`env_var` if given, else `name`), (c) configured file
    /// mount, trimmed of trailing whitespace, rejected if empty. Missing
    /// credentials return `None` without raising.
    pub fn get_credential(&self, name: &str, env_var: Option<&str>) -> Option<String> {
        if let Some(existing) = self.secrets.lock().get(name) {
            return Some(existing.clone());
        }

        let env_key = env_var.unwrap_or(name);
        if let Ok(value) = std::env::var(env_key) {
            if !value.is_empty() {
                self.remember(name, value.clone());
                return Some(value);
            }
        }

        let file_path = self.file_mounts.lock().get(name).cloned();
        if let Some(path) = file_path {
            if let Ok(content) = std::fs::read_to_string(&path) {
                let trimmed = content.trim_end().to_string();
                if !trimmed.is_empty() {
                    self.remember(name, trimmed.clone());
                    return Some(trimmed);
                }
            }
        }

        None
    }

    /// Raise if any name in `required` failed to resolve via a prior
    /// `get_credential` call.
    pub fn validate(&self, required: &[&str]) -> Result<(), rn_core::RunnerError> {
        let secrets = self.secrets.lock();
        let missing: Vec<&str> = required
            .iter()
            .filter(|name| !secrets.contains_key(**name))
            .copied()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(rn_core::RunnerError::context_invalid(format!(
                "missing required credentials: {}",
                missing.join(", ")
            )))
        }
    }

    fn remember(&self, name: &str, value: String) {
        self.secrets.lock().insert(name.to_string(), value.clone());
        self.mask_set.lock().insert(value);
    }

    /// Replace every known secret value in `text`, then apply pattern-based
    /// redactions. Idempotent: `mask(mask(text)) == mask(text)`.
    pub fn mask(&self, text: &str) -> String {
        let mut masked = text.to_string();

        let mut known: Vec<String> = self.mask_set.lock().iter().cloned().collect();
        known.sort_by_key(|b| std::cmp::Reverse(b.len()));
        for secret in &known {
            if secret.is_empty() {
                continue;
            }
            let replacement = if secret.len() > 12 {
                format!("{}***{}", &secret[..4], &secret[secret.len() - 4..])
            } else {
                "***".to_string()
            };
            masked = masked.replace(secret.as_str(), &replacement);
        }

        for (pattern, replacement) in REDACTION_RULES.iter() {
            masked = pattern.replace_all(&masked, *replacement).into_owned();
        }

        masked
    }

    /// Recursively mask a JSON value: keys whose lowercased form contains
    /// any of `{token, password, secret, key, credential}` have their
    /// string values replaced by `***` regardless of content; other string
    /// values still pass through `mask`; non-string scalars pass through
    /// unchanged.
    pub fn mask_structured(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, v) in map {
                    let lower = key.to_lowercase();
                    let sensitive_key = SENSITIVE_KEY_MARKERS.iter().any(|m| lower.contains(m));
                    let masked_value = if sensitive_key {
                        match v {
                            Value::String(_) => Value::String("***".to_string()),
                            other => self.mask_structured(other),
                        }
                    } else {
                        self.mask_structured(v)
                    };
                    out.insert(key.clone(), masked_value);
                }
                Value::Object(out)
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.mask_structured(v)).collect())
            }
            Value::String(s) => Value::String(self.mask(s)),
            other => other.clone(),
        }
    }

    /// Best-effort scrub: every stored value is overwritten with an
    /// equal-length run of `X` before the entry is dropped, then the mask
    /// set is cleared. Safe Rust cannot guarantee the original allocation
    /// is zeroed in place without `unsafe`, which this workspace forbids;
    /// this is the closest approximation available.
    pub fn clear(&self) {
        let mut secrets = self.secrets.lock();
        for value in secrets.values_mut() {
            *value = "X".repeat(value.len());
        }
        secrets.clear();
        self.mask_set.lock().clear();
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
