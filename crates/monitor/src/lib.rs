// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rn-monitor: the Execution Monitor. Three sub-services sharing a
//! Start/Check/Stop lifecycle — a deadline timer, a background resource
//! sampler, and a service-call tracker — combined behind [`ExecutionMonitor`].

mod deadline;
mod monitor;
mod resource_sampler;
mod service_call_tracker;

pub use deadline::Deadline;
pub use monitor::{ExecutionMonitor, MonitorStatus, ResourceLimits};
pub use resource_sampler::{ResourceAverage, ResourceSample, ResourceSampler, ResourceUsageSummary, DEFAULT_SAMPLE_INTERVAL};
pub use service_call_tracker::{
    AllServiceStats, ExternalServiceStats, LlmStats, ServiceAggregate, ServiceCall, ServiceCallStats,
    ServiceCallTracker,
};
