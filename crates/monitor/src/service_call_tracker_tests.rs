// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rn_core::FakeClock;

fn tracker() -> ServiceCallTracker {
    ServiceCallTracker::new(Arc::new(FakeClock::new(1_000_000)))
}

fn meta(tokens: u64) -> HashMap<String, Value> {
    let mut m = HashMap::new();
    m.insert("tokens_used".to_string(), Value::from(tokens));
    m
}

#[test]
fn empty_statistics_are_zeroed() {
    let t = tracker();
    let stats = t.service_statistics(None);
    assert_eq!(stats.total_calls, 0);
    assert_eq!(stats.min_duration_seconds, 0.0);
    assert_eq!(stats.max_duration_seconds, 0.0);
}

#[test]
fn record_and_aggregate_all_calls() {
    let t = tracker();
    t.record_call("anthropic", "generate_code", 1.5, true, None, meta(100));
    t.record_call("task_registry", "update_status", 0.2, true, None, HashMap::new());
    t.record_call("anthropic", "generate_code", 2.5, false, Some("rate limited".into()), meta(50));

    let stats = t.service_statistics(None);
    assert_eq!(stats.total_calls, 3);
    assert_eq!(stats.successful_calls, 2);
    assert_eq!(stats.failed_calls, 1);
    assert_eq!(stats.min_duration_seconds, 0.2);
    assert_eq!(stats.max_duration_seconds, 2.5);
}

#[test]
fn llm_statistics_sum_tokens_and_ignore_external_calls() {
    let t = tracker();
    t.record_call("anthropic", "generate_code", 1.0, true, None, meta(100));
    t.record_call("openai", "generate_code", 2.0, true, None, meta(200));
    t.record_call("task_registry", "update_status", 0.1, true, None, HashMap::new());

    let llm = t.llm_statistics();
    assert_eq!(llm.total_calls, 2);
    assert_eq!(llm.total_tokens_used, 300);
}

#[test]
fn external_statistics_group_by_service() {
    let t = tracker();
    t.record_call("task_registry", "update_status", 0.5, true, None, HashMap::new());
    t.record_call("task_registry", "get_task", 0.3, true, None, HashMap::new());
    t.record_call("artifact_store", "upload", 1.0, true, None, HashMap::new());

    let ext = t.external_service_statistics();
    assert_eq!(ext.total_calls, 3);
    assert_eq!(ext.by_service.len(), 2);
    assert_eq!(ext.by_service["task_registry"].total_calls, 2);
}

#[test]
fn filters_calls_by_service_name() {
    let t = tracker();
    t.record_call("anthropic", "generate_code", 1.0, true, None, HashMap::new());
    t.record_call("task_registry", "update_status", 0.1, true, None, HashMap::new());

    assert_eq!(t.calls_by_service("anthropic").len(), 1);
    assert_eq!(t.llm_calls().len(), 1);
    assert_eq!(t.external_service_calls().len(), 1);
}

#[test]
fn clear_removes_all_calls() {
    let t = tracker();
    t.record_call("anthropic", "generate_code", 1.0, true, None, HashMap::new());
    t.clear();
    assert_eq!(t.service_statistics(None).total_calls, 0);
}

#[test]
fn all_statistics_bundles_llm_external_and_total() {
    let t = tracker();
    t.record_call("anthropic", "generate_code", 1.0, true, None, meta(10));
    t.record_call("task_registry", "update_status", 0.1, true, None, HashMap::new());

    let all = t.all_statistics();
    assert_eq!(all.llm.total_calls, 1);
    assert_eq!(all.external_services.total_calls, 1);
    assert_eq!(all.all_calls.total_calls, 2);
}
