// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn ws() -> Workspace {
    Workspace::new(PathBuf::from("/var/rn/slots/0"), "task/task-1", "main")
}

#[test]
fn resolve_joins_relative_path() {
    let w = ws();
    assert_eq!(
        w.resolve(std::path::Path::new("src/main.rs")),
        Some(PathBuf::from("/var/rn/slots/0/src/main.rs"))
    );
}

#[test]
fn resolve_rejects_parent_dir_escape() {
    let w = ws();
    assert_eq!(w.resolve(std::path::Path::new("../../etc/passwd")), None);
}

#[test]
fn resolve_allows_plain_relative_with_dot() {
    let w = ws();
    assert!(w.resolve(std::path::Path::new("./src/lib.rs")).is_some());
}

#[test]
fn round_trips_through_json() {
    let w = ws();
    let json = serde_json::to_string(&w).unwrap();
    let back: Workspace = serde_json::from_str(&json).unwrap();
    assert_eq!(w, back);
}
