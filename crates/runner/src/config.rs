// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process environment configuration: one `pub fn` per recognized key,
//! each with a typed default, mirroring the daemon's `env.rs` convention
//! rather than a single struct deserialized from one source.

use rn_core::RetryPolicy;
use std::path::PathBuf;

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_str(key).and_then(|v| v.parse().ok())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_str(key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

/// Global cap on concurrent Runners; `None` is unlimited.
pub fn max_parallel_runners() -> Option<u32> {
    env_parse("RN_MAX_PARALLEL_RUNNERS")
}

/// Default per-task wall-clock ceiling, used when a `TaskContext` doesn't
/// carry its own `timeout_seconds`.
pub fn default_timeout_seconds() -> u64 {
    env_parse("RN_DEFAULT_TIMEOUT_SECONDS").unwrap_or(3600)
}

pub fn max_memory_mb() -> Option<f64> {
    env_parse("RN_MAX_MEMORY_MB")
}

pub fn max_cpu_percent() -> Option<f64> {
    env_parse("RN_MAX_CPU_PERCENT")
}

/// Network-class retry ladder (LLM calls, git push), overriding only the
/// attempt count — the backoff shape itself is fixed by spec.md §5.
pub fn network_retry_policy() -> RetryPolicy {
    let max_retries = env_parse("RN_NETWORK_RETRY_MAX_RETRIES").unwrap_or(3);
    let mut policy = RetryPolicy::network_default();
    policy.max_retries = max_retries;
    policy
}

/// Task-class retry ladder (dispatcher-driven `RetryInfo`).
pub fn git_retry_policy() -> RetryPolicy {
    let max_retries = env_parse("RN_GIT_RETRY_MAX_RETRIES").unwrap_or(3);
    let mut policy = RetryPolicy::task_default();
    policy.max_retries = max_retries;
    policy
}

/// Toggle pattern-based secret masking. Masking is a safety invariant of
/// `rn_security::CredentialStore` and is always applied by the
/// Orchestrator's own log emitters; this flag only gates whether the
/// Runner process itself additionally double-checks it is enabled at
/// startup (a `false` value is logged as a warning, not honored, since
/// disabling masking has no supported code path).
pub fn mask_secrets() -> bool {
    env_bool("RN_MASK_SECRETS", true)
}

pub fn artifact_store_url() -> String {
    env_str("RN_ARTIFACT_STORE_URL").unwrap_or_else(|| "http://localhost:8000".to_string())
}

pub fn task_registry_url() -> String {
    env_str("RN_TASK_REGISTRY_URL").unwrap_or_else(|| "http://localhost:8001".to_string())
}

pub fn repo_pool_url() -> String {
    env_str("RN_REPO_POOL_URL").unwrap_or_else(|| "http://localhost:8002".to_string())
}

pub fn llm_model() -> String {
    env_str("RN_LLM_MODEL").unwrap_or_else(|| "gpt-4".to_string())
}

pub fn llm_timeout_seconds() -> u64 {
    env_parse("RN_LLM_TIMEOUT_SECONDS").unwrap_or(120)
}

pub fn llm_max_tokens() -> Option<u32> {
    env_parse("RN_LLM_MAX_TOKENS")
}

/// Enable `RunnerStateSnapshot` persistence to `state_file_path()`.
pub fn persist_state() -> bool {
    env_bool("RN_PERSIST_STATE", false)
}

pub fn state_file_path() -> Option<PathBuf> {
    env_str("RN_STATE_FILE_PATH").map(PathBuf::from)
}

pub fn coordination_dir() -> Option<PathBuf> {
    env_str("RN_COORDINATION_DIR").map(PathBuf::from)
}

pub fn enable_health_check() -> bool {
    env_bool("RN_ENABLE_HEALTH_CHECK", false)
}

pub fn health_check_port() -> u16 {
    env_parse("RN_HEALTH_CHECK_PORT").unwrap_or(8080)
}

pub fn log_level() -> String {
    env_str("RN_LOG_LEVEL").unwrap_or_else(|| "info".to_string())
}

pub fn structured_logging() -> bool {
    env_bool("RN_STRUCTURED_LOGGING", false)
}

pub fn log_file() -> Option<PathBuf> {
    env_str("RN_LOG_FILE").map(PathBuf::from)
}

/// Name of the environment variable holding the git push credential
/// (resolved later by `rn_security::CredentialStore`, not read here).
pub fn git_token_env_var() -> String {
    env_str("RN_GIT_TOKEN_ENV_VAR").unwrap_or_else(|| "GIT_TOKEN".to_string())
}

pub fn artifact_store_api_key_env_var() -> String {
    env_str("RN_ARTIFACT_STORE_API_KEY_ENV_VAR")
        .unwrap_or_else(|| "ARTIFACT_STORE_API_KEY".to_string())
}

pub fn llm_api_key_env_var() -> String {
    env_str("RN_LLM_API_KEY_ENV_VAR").unwrap_or_else(|| "OPENAI_API_KEY".to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
