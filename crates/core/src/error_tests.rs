// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn kind_matches_variant() {
    assert_eq!(RunnerError::security("x").kind(), "SecurityFailure");
    assert_eq!(RunnerError::context_invalid("x").kind(), "ContextInvalid");
    assert_eq!(RunnerError::timeout("x").kind(), "Timeout");
    assert_eq!(RunnerError::resource_limit("x").kind(), "ResourceLimit");
}

#[test]
fn display_includes_message() {
    let err = RunnerError::TestFailed {
        message: "2 of 5 tests failed".to_string(),
    };
    assert!(err.to_string().contains("2 of 5 tests failed"));
}

#[test]
fn push_failed_includes_retry_count() {
    let err = RunnerError::PushFailed {
        message: "remote rejected".to_string(),
        retry_count: 3,
    };
    assert!(err.to_string().contains('3'));
}
