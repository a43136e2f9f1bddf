// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rn_core::{FakeClock, TaskId};
use std::sync::Arc;

fn coordinator(dir: &std::path::Path, clock: FakeClock) -> Coordinator {
    Coordinator::with_clock(dir.to_path_buf(), Arc::new(clock))
}

#[test]
fn register_then_concurrent_count_reflects_it() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);

    assert!(c.register(
        RunnerId::from("r1"),
        TaskId::from("t1"),
        "spec-a",
        "/ws/a",
    ));
    assert_eq!(c.concurrent_count(), 1);
}

#[test]
fn register_rejects_workspace_already_claimed() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);

    assert!(c.register(RunnerId::from("r1"), TaskId::from("t1"), "spec-a", "/ws/a"));
    assert!(!c.register(RunnerId::from("r2"), TaskId::from("t2"), "spec-b", "/ws/a"));
}

#[test]
fn register_rejects_when_at_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock).with_max_parallel_runners(Some(1));

    assert!(c.register(RunnerId::from("r1"), TaskId::from("t1"), "spec-a", "/ws/a"));
    assert!(!c.register(RunnerId::from("r2"), TaskId::from("t2"), "spec-b", "/ws/b"));
}

#[test]
fn unregister_removes_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);
    let runner_id = RunnerId::from("r1");

    c.register(runner_id.clone(), TaskId::from("t1"), "spec-a", "/ws/a");
    assert_eq!(c.concurrent_count(), 1);
    c.unregister(&runner_id);
    assert_eq!(c.concurrent_count(), 0);
}

#[test]
fn unregister_unknown_runner_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);
    c.unregister(&RunnerId::from("ghost"));
}

#[test]
fn stale_record_swept_on_register() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock.clone()).with_heartbeat_timeout_ms(1_000);

    c.register(RunnerId::from("r1"), TaskId::from("t1"), "spec-a", "/ws/a");
    clock.advance(2_000);
    assert!(c.register(RunnerId::from("r2"), TaskId::from("t2"), "spec-b", "/ws/a"));
}

#[test]
fn heartbeat_refreshes_last_heartbeat_and_prevents_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock.clone()).with_heartbeat_timeout_ms(1_000);
    let runner_id = RunnerId::from("r1");

    c.register(runner_id.clone(), TaskId::from("t1"), "spec-a", "/ws/a");
    clock.advance(500);
    c.heartbeat(&runner_id);
    clock.advance(900);
    assert_eq!(c.concurrent_count(), 1);
}

#[test]
fn heartbeat_unknown_runner_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);
    c.heartbeat(&RunnerId::from("ghost"));
}

#[test]
fn detect_conflicts_reports_shared_files_and_branches() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);

    c.register(RunnerId::from("r1"), TaskId::from("t1"), "spec-a", "/ws/a");
    c.update_resources(
        &RunnerId::from("r1"),
        Some(vec!["src/lib.rs".to_string()]),
        Some(vec!["feature/x".to_string()]),
    );

    let conflicts = c.detect_conflicts(
        &RunnerId::from("r2"),
        &["src/lib.rs".to_string()],
        &["feature/x".to_string()],
    );
    assert_eq!(conflicts.len(), 2);
}

#[test]
fn detect_conflicts_excludes_self() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);
    let runner_id = RunnerId::from("r1");

    c.register(runner_id.clone(), TaskId::from("t1"), "spec-a", "/ws/a");
    c.update_resources(&runner_id, Some(vec!["src/lib.rs".to_string()]), None);

    let conflicts = c.detect_conflicts(&runner_id, &["src/lib.rs".to_string()], &[]);
    assert!(conflicts.is_empty());
}

#[test]
fn detect_conflicts_empty_when_no_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);

    c.register(RunnerId::from("r1"), TaskId::from("t1"), "spec-a", "/ws/a");
    c.update_resources(&RunnerId::from("r1"), Some(vec!["a.rs".to_string()]), None);

    let conflicts = c.detect_conflicts(&RunnerId::from("r2"), &["b.rs".to_string()], &[]);
    assert!(conflicts.is_empty());
}

#[test]
fn wait_time_zero_when_unbounded() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock);
    assert_eq!(c.wait_time_ms(), 0);
}

#[test]
fn wait_time_zero_when_under_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock).with_max_parallel_runners(Some(2));
    c.register(RunnerId::from("r1"), TaskId::from("t1"), "spec-a", "/ws/a");
    assert_eq!(c.wait_time_ms(), 0);
}

#[test]
fn wait_time_estimates_remaining_when_at_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock.clone()).with_max_parallel_runners(Some(1));
    c.register(RunnerId::from("r1"), TaskId::from("t1"), "spec-a", "/ws/a");
    clock.advance(600_000);

    let wait = c.wait_time_ms();
    assert_eq!(wait, 1_800_000 - 600_000);
}

#[test]
fn wait_time_honors_estimated_task_seconds_override() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new(1_000);
    let c = coordinator(dir.path(), clock.clone())
        .with_max_parallel_runners(Some(1))
        .with_estimated_task_seconds(60);
    c.register(RunnerId::from("r1"), TaskId::from("t1"), "spec-a", "/ws/a");
    clock.advance(20_000);

    assert_eq!(c.wait_time_ms(), 60_000 - 20_000);
}
