// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::runner_state::RunnerStateSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    n: u32,
    label: String,
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.json");
    let sample = Sample {
        n: 7,
        label: "seven".to_string(),
    };
    write_atomic(&path, &sample).unwrap();
    let back: Option<Sample> = read_if_exists(&path).unwrap();
    assert_eq!(back, Some(sample));
}

#[test]
fn read_missing_file_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let back: Option<Sample> = read_if_exists(&path).unwrap();
    assert_eq!(back, None);
}

#[test]
fn write_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deep/record.json");
    write_atomic(&path, &Sample { n: 1, label: "x".to_string() }).unwrap();
    assert!(path.exists());
}

#[test]
fn write_leaves_no_tmp_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.json");
    write_atomic(&path, &Sample { n: 1, label: "x".to_string() }).unwrap();
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn real_snapshot_type_round_trips_through_atomic_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let snap = RunnerStateSnapshot::new(crate::id::RunnerId::from("runner-1"), 1_000);
    write_atomic(&path, &snap).unwrap();
    let back: Option<RunnerStateSnapshot> = read_if_exists(&path).unwrap();
    assert_eq!(back, Some(snap));
}
