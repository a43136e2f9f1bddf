// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Combined timeout, resource, and service-call monitoring for one task
//! execution. `check` is called at every Orchestrator phase boundary.

use crate::deadline::Deadline;
use crate::resource_sampler::{ResourceSampler, ResourceUsageSummary};
use crate::service_call_tracker::{AllServiceStats, ServiceCallTracker};
use rn_core::{Clock, RunnerError, SystemClock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceLimits {
    pub max_memory_mb: Option<f64>,
    pub max_cpu_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub elapsed_seconds: f64,
    pub remaining_seconds: f64,
    pub timed_out: bool,
    pub resource_usage: ResourceUsageSummary,
    pub service_calls: AllServiceStats,
}

pub struct ExecutionMonitor {
    deadline: Deadline,
    resource_sampler: ResourceSampler,
    service_call_tracker: ServiceCallTracker,
}

impl ExecutionMonitor {
    pub fn new(timeout_seconds: u64, limits: ResourceLimits) -> Self {
        Self::with_clock(Arc::new(SystemClock), timeout_seconds, limits, crate::resource_sampler::DEFAULT_SAMPLE_INTERVAL)
    }

    pub fn with_clock(
        clock: Arc<dyn Clock>,
        timeout_seconds: u64,
        limits: ResourceLimits,
        sample_interval: Duration,
    ) -> Self {
        let timeout_ms = timeout_seconds.saturating_mul(1000);
        Self {
            deadline: Deadline::new(clock.clone(), timeout_ms),
            resource_sampler: ResourceSampler::with_interval(
                clock.clone(),
                limits.max_memory_mb,
                limits.max_cpu_percent,
                sample_interval,
            ),
            service_call_tracker: ServiceCallTracker::new(clock),
        }
    }

    pub fn start(&self) {
        self.deadline.start(None);
        self.resource_sampler.start();
    }

    pub fn stop(&self) {
        self.deadline.stop();
        self.resource_sampler.stop();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_service_call(
        &self,
        service_name: impl Into<String>,
        operation: impl Into<String>,
        duration_seconds: f64,
        success: bool,
        error: Option<String>,
        metadata: HashMap<String, Value>,
    ) {
        self.service_call_tracker
            .record_call(service_name, operation, duration_seconds, success, error, metadata);
    }

    pub fn service_call_tracker(&self) -> &ServiceCallTracker {
        &self.service_call_tracker
    }

    /// Checks timeout and resource limits, in that priority order.
    pub fn check(&self) -> Result<(), RunnerError> {
        if self.deadline.check() {
            return Err(RunnerError::timeout(format!(
                "task execution timeout: {:.2}s elapsed",
                self.deadline.get_elapsed_ms() as f64 / 1000.0
            )));
        }
        if self.resource_sampler.limit_exceeded() {
            let reason = self
                .resource_sampler
                .limit_exceeded_reason()
                .unwrap_or_else(|| "resource limit exceeded".to_string());
            return Err(RunnerError::resource_limit(reason));
        }
        Ok(())
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            elapsed_seconds: self.deadline.get_elapsed_ms() as f64 / 1000.0,
            remaining_seconds: self.deadline.get_remaining_ms() as f64 / 1000.0,
            timed_out: self.deadline.is_timed_out(),
            resource_usage: self.resource_sampler.usage_summary(),
            service_calls: self.service_call_tracker.all_statistics(),
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
