// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rn-shell: timeout-bounded subprocess execution shared by the Workspace
//! Manager and the Playbook Evaluator.

pub mod exec;

pub use exec::{
    run_shell_command, run_with_timeout, CommandOutput, GIT_TIMEOUT, MAX_CAPTURED_BYTES,
    PLAYBOOK_STEP_TIMEOUT,
};
