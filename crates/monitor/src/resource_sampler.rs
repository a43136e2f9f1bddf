// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background sampling of the Runner process's own memory and CPU usage.
//! Degrades silently (zero-sample summary) on platforms where `sysinfo`
//! cannot resolve the current process.

use parking_lot::Mutex;
use rn_core::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tracing::warn;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub timestamp_ms: u64,
    pub memory_rss_mb: f64,
    pub memory_percent: f64,
    pub cpu_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAverage {
    pub memory_rss_mb: f64,
    pub cpu_percent: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsageSummary {
    pub current: Option<ResourceSample>,
    pub peak: Option<ResourceSample>,
    pub average: Option<ResourceAverage>,
    pub limit_exceeded: bool,
    pub limit_exceeded_reason: Option<String>,
    pub sample_count: usize,
}

struct Inner {
    history: Vec<ResourceSample>,
    limit_exceeded: bool,
    limit_exceeded_reason: Option<String>,
}

impl Inner {
    fn new() -> Self {
        Self {
            history: Vec::new(),
            limit_exceeded: false,
            limit_exceeded_reason: None,
        }
    }

    fn record(&mut self, sample: ResourceSample, max_memory_mb: Option<f64>, max_cpu_percent: Option<f64>) {
        if let Some(max) = max_memory_mb {
            if sample.memory_rss_mb > max {
                self.limit_exceeded = true;
                self.limit_exceeded_reason = Some(format!(
                    "memory limit exceeded: {:.1}MB > {:.1}MB",
                    sample.memory_rss_mb, max
                ));
                warn!(reason = %self.limit_exceeded_reason.as_ref().unwrap(), "resource limit exceeded");
            }
        }
        if let Some(max) = max_cpu_percent {
            if sample.cpu_percent > max {
                self.limit_exceeded = true;
                self.limit_exceeded_reason = Some(format!(
                    "cpu limit exceeded: {:.1}% > {:.1}%",
                    sample.cpu_percent, max
                ));
                warn!(reason = %self.limit_exceeded_reason.as_ref().unwrap(), "resource limit exceeded");
            }
        }
        self.history.push(sample);
    }
}

/// Periodically samples this process's memory/CPU usage in the background.
pub struct ResourceSampler {
    clock: Arc<dyn Clock>,
    max_memory_mb: Option<f64>,
    max_cpu_percent: Option<f64>,
    sample_interval: Duration,
    inner: Arc<Mutex<Inner>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceSampler {
    pub fn new(clock: Arc<dyn Clock>, max_memory_mb: Option<f64>, max_cpu_percent: Option<f64>) -> Self {
        Self::with_interval(clock, max_memory_mb, max_cpu_percent, DEFAULT_SAMPLE_INTERVAL)
    }

    pub fn with_interval(
        clock: Arc<dyn Clock>,
        max_memory_mb: Option<f64>,
        max_cpu_percent: Option<f64>,
        sample_interval: Duration,
    ) -> Self {
        Self {
            clock,
            max_memory_mb,
            max_cpu_percent,
            sample_interval,
            inner: Arc::new(Mutex::new(Inner::new())),
            task: Mutex::new(None),
        }
    }

    pub fn start(&self) {
        self.stop();
        {
            let mut inner = self.inner.lock();
            *inner = Inner::new();
        }

        let inner = self.inner.clone();
        let clock = self.clock.clone();
        let max_memory_mb = self.max_memory_mb;
        let max_cpu_percent = self.max_cpu_percent;
        let interval = self.sample_interval;

        let handle = tokio::spawn(async move {
            let mut system = System::new();
            let Some(pid) = sysinfo::get_current_pid().ok() else {
                warn!("process-resource queries unavailable on this platform; resource sampling disabled");
                return;
            };

            loop {
                tokio::time::sleep(interval).await;
                if let Some(sample) = sample_once(&mut system, pid, clock.epoch_ms()) {
                    inner.lock().record(sample, max_memory_mb, max_cpu_percent);
                }
            }
        });

        *self.task.lock() = Some(handle);
    }

    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }

    pub fn limit_exceeded(&self) -> bool {
        self.inner.lock().limit_exceeded
    }

    pub fn limit_exceeded_reason(&self) -> Option<String> {
        self.inner.lock().limit_exceeded_reason.clone()
    }

    pub fn current_usage(&self) -> Option<ResourceSample> {
        self.inner.lock().history.last().copied()
    }

    pub fn peak_usage(&self) -> Option<ResourceSample> {
        self.inner
            .lock()
            .history
            .iter()
            .copied()
            .max_by(|a, b| a.memory_rss_mb.total_cmp(&b.memory_rss_mb))
    }

    pub fn average_usage(&self) -> Option<ResourceAverage> {
        let inner = self.inner.lock();
        if inner.history.is_empty() {
            return None;
        }
        let count = inner.history.len();
        let memory_rss_mb = inner.history.iter().map(|s| s.memory_rss_mb).sum::<f64>() / count as f64;
        let cpu_percent = inner.history.iter().map(|s| s.cpu_percent).sum::<f64>() / count as f64;
        Some(ResourceAverage {
            memory_rss_mb,
            cpu_percent,
            sample_count: count,
        })
    }

    pub fn usage_summary(&self) -> ResourceUsageSummary {
        let inner = self.inner.lock();
        ResourceUsageSummary {
            current: inner.history.last().copied(),
            peak: inner
                .history
                .iter()
                .copied()
                .max_by(|a, b| a.memory_rss_mb.total_cmp(&b.memory_rss_mb)),
            average: if inner.history.is_empty() {
                None
            } else {
                let count = inner.history.len();
                Some(ResourceAverage {
                    memory_rss_mb: inner.history.iter().map(|s| s.memory_rss_mb).sum::<f64>() / count as f64,
                    cpu_percent: inner.history.iter().map(|s| s.cpu_percent).sum::<f64>() / count as f64,
                    sample_count: count,
                })
            },
            limit_exceeded: inner.limit_exceeded,
            limit_exceeded_reason: inner.limit_exceeded_reason.clone(),
            sample_count: inner.history.len(),
        }
    }

    /// Records a sample taken outside the background loop, mainly for tests
    /// that need deterministic control over timing.
    pub(crate) fn record_for_test(&self, sample: ResourceSample) {
        self.inner.lock().record(sample, self.max_memory_mb, self.max_cpu_percent);
    }
}

impl Drop for ResourceSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sample_once(system: &mut System, pid: Pid, timestamp_ms: u64) -> Option<ResourceSample> {
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    let process = system.process(pid)?;
    let memory_bytes = process.memory() as f64;
    let memory_rss_mb = memory_bytes / (1024.0 * 1024.0);
    let total_memory_bytes = system.total_memory() as f64;
    let memory_percent = if total_memory_bytes > 0.0 {
        (memory_bytes / total_memory_bytes) * 100.0
    } else {
        0.0
    };
    let cpu_percent = process.cpu_usage() as f64;

    Some(ResourceSample {
        timestamp_ms,
        memory_rss_mb,
        memory_percent,
        cpu_percent,
    })
}

#[cfg(test)]
#[path = "resource_sampler_tests.rs"]
mod tests;
