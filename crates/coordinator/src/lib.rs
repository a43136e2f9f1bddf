// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rn-coordinator: the Parallel Coordinator. A file-backed registry of
//! live Runner instances, used to detect file/branch conflicts, enforce
//! a global parallel-runner cap, and estimate admission wait time.

mod coordinator;
mod guard;

pub use coordinator::{Coordinator, DEFAULT_HEARTBEAT_TIMEOUT_MS};
pub use guard::{CoordinationGuard, DEFAULT_HEARTBEAT_INTERVAL};
