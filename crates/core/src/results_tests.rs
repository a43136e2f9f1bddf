// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn passing_test_result() -> TestResult {
    TestResult {
        success: true,
        duration_seconds: 1.2,
        results: vec![SingleTestResult {
            name: "it_works".to_string(),
            passed: true,
            message: None,
        }],
        exit_code: 0,
    }
}

#[test]
fn failed_count_is_zero_when_all_pass() {
    assert_eq!(passing_test_result().failed_count(), 0);
}

#[test]
fn failed_count_counts_failed_cases() {
    let mut r = passing_test_result();
    r.results.push(SingleTestResult {
        name: "it_breaks".to_string(),
        passed: false,
        message: Some("assertion failed".to_string()),
    });
    assert_eq!(r.failed_count(), 1);
}

#[test]
fn change_operation_round_trips_through_json() {
    let change = CodeChange {
        file_path: PathBuf::from("src/lib.rs"),
        operation: ChangeOperation::Modify,
        content: "fn main() {}".to_string(),
    };
    let json = serde_json::to_value(&change).unwrap();
    assert_eq!(json["operation"], "modify");
    let back: CodeChange = serde_json::from_value(json).unwrap();
    assert_eq!(change, back);
}

#[test]
fn runner_result_round_trips_and_omits_absent_error() {
    let result = RunnerResult {
        task_id: crate::id::TaskId::from("t1"),
        success: true,
        error: None,
        duration_seconds: 4.0,
        implementation: None,
        tests: None,
        push: None,
        artifacts: vec![Artifact {
            kind: ArtifactKind::Diff,
            uri: "artifact://diff/1".to_string(),
            size_bytes: 128,
            metadata: Default::default(),
            created_at_ms: 1_000,
        }],
        concurrent_runners: 2,
        workspace_path: PathBuf::from("/w/1"),
    };
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("error").is_none());
    let back: RunnerResult = serde_json::from_value(json).unwrap();
    assert_eq!(result, back);
}

#[test]
fn failed_runner_result_carries_error_string() {
    let result = RunnerResult {
        task_id: crate::id::TaskId::from("t1"),
        success: false,
        error: Some("tests failed".to_string()),
        duration_seconds: 2.0,
        implementation: None,
        tests: None,
        push: None,
        artifacts: vec![],
        concurrent_runners: 1,
        workspace_path: PathBuf::from("/w/1"),
    };
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("tests failed"));
}
