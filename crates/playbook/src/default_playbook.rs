// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A built-in `Playbook` used when a task names no `playbook_path`,
//! grounded on the original implementation's `DEFAULT_PLAYBOOK` table.

use crate::model::{Playbook, PlaybookStep};
use serde_json::json;
use std::collections::HashMap;

pub fn default_playbook() -> Playbook {
    Playbook {
        name: "Default Task Playbook".to_string(),
        steps: vec![
            PlaybookStep {
                name: "Install dependencies".to_string(),
                command: "echo 'no dependency installation configured'".to_string(),
                condition: Some("install_deps == true".to_string()),
                fail_fast: false,
                timeout_seconds: 300,
                retry_count: 2,
            },
            PlaybookStep {
                name: "Run linter".to_string(),
                command: "echo 'no linter configured'".to_string(),
                condition: Some("lint_enabled == true".to_string()),
                fail_fast: false,
                timeout_seconds: 300,
                retry_count: 0,
            },
            PlaybookStep {
                name: "Run tests".to_string(),
                command: "echo 'no tests configured'".to_string(),
                condition: Some("test_enabled == true".to_string()),
                fail_fast: true,
                timeout_seconds: 600,
                retry_count: 0,
            },
            PlaybookStep {
                name: "Build project".to_string(),
                command: "echo 'no build configured'".to_string(),
                condition: Some("build_enabled == true".to_string()),
                fail_fast: true,
                timeout_seconds: 600,
                retry_count: 1,
            },
        ],
        metadata: HashMap::from([("source".to_string(), json!("default"))]),
    }
}
