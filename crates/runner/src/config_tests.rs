// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Mutex;

/// Serializes tests that mutate process environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn defaults_when_unset() {
    let _lock = ENV_LOCK.lock().unwrap();
    std::env::remove_var("RN_MAX_PARALLEL_RUNNERS");
    std::env::remove_var("RN_DEFAULT_TIMEOUT_SECONDS");
    std::env::remove_var("RN_MASK_SECRETS");
    std::env::remove_var("RN_ENABLE_HEALTH_CHECK");

    assert_eq!(max_parallel_runners(), None);
    assert_eq!(default_timeout_seconds(), 3600);
    assert!(mask_secrets());
    assert!(!enable_health_check());
    assert_eq!(llm_model(), "gpt-4");
}

#[test]
fn reads_overrides_from_env() {
    let _lock = ENV_LOCK.lock().unwrap();
    std::env::set_var("RN_MAX_PARALLEL_RUNNERS", "5");
    std::env::set_var("RN_LLM_MODEL", "gpt-4o-mini");
    std::env::set_var("RN_MASK_SECRETS", "false");

    assert_eq!(max_parallel_runners(), Some(5));
    assert_eq!(llm_model(), "gpt-4o-mini");
    assert!(!mask_secrets());

    std::env::remove_var("RN_MAX_PARALLEL_RUNNERS");
    std::env::remove_var("RN_LLM_MODEL");
    std::env::remove_var("RN_MASK_SECRETS");
}

#[test]
fn invalid_numeric_override_falls_back_to_default() {
    let _lock = ENV_LOCK.lock().unwrap();
    std::env::set_var("RN_HEALTH_CHECK_PORT", "not_a_port");
    assert_eq!(health_check_port(), 8080);
    std::env::remove_var("RN_HEALTH_CHECK_PORT");
}

#[test]
fn retry_policy_overrides_only_max_retries() {
    let _lock = ENV_LOCK.lock().unwrap();
    std::env::set_var("RN_NETWORK_RETRY_MAX_RETRIES", "7");
    let policy = network_retry_policy();
    assert_eq!(policy.max_retries, 7);
    assert_eq!(policy.initial_delay, RetryPolicy::network_default().initial_delay);
    std::env::remove_var("RN_NETWORK_RETRY_MAX_RETRIES");
}
