// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Records duration and outcome of every outbound call the Runner makes
//! (LLM generation, Task Registry, Workspace Pool Allocator, Artifact
//! Store, ...) and aggregates per-service statistics.

use parking_lot::Mutex;
use rn_core::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const LLM_SERVICES: &[&str] = &["openai", "llm", "anthropic", "cohere"];
const EXTERNAL_SERVICES: &[&str] = &[
    "task_registry",
    "repo_pool",
    "artifact_store",
    "github",
    "gitlab",
    "bitbucket",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub service_name: String,
    pub operation: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub duration_seconds: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceCallStats {
    pub total_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
    pub total_duration_seconds: f64,
    pub average_duration_seconds: f64,
    pub min_duration_seconds: f64,
    pub max_duration_seconds: f64,
}

impl ServiceCallStats {
    fn empty() -> Self {
        Self {
            total_calls: 0,
            successful_calls: 0,
            failed_calls: 0,
            total_duration_seconds: 0.0,
            average_duration_seconds: 0.0,
            min_duration_seconds: 0.0,
            max_duration_seconds: 0.0,
        }
    }

    fn from_calls(calls: &[&ServiceCall]) -> Self {
        if calls.is_empty() {
            return Self::empty();
        }
        let durations: Vec<f64> = calls.iter().map(|c| c.duration_seconds).collect();
        Self {
            total_calls: calls.len(),
            successful_calls: calls.iter().filter(|c| c.success).count(),
            failed_calls: calls.iter().filter(|c| !c.success).count(),
            total_duration_seconds: durations.iter().sum(),
            average_duration_seconds: durations.iter().sum::<f64>() / durations.len() as f64,
            min_duration_seconds: durations.iter().cloned().fold(f64::INFINITY, f64::min),
            max_duration_seconds: durations.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmStats {
    pub total_calls: usize,
    pub total_duration_seconds: f64,
    pub average_duration_seconds: f64,
    pub min_duration_seconds: f64,
    pub max_duration_seconds: f64,
    pub total_tokens_used: u64,
}

impl LlmStats {
    fn from_calls(calls: &[&ServiceCall]) -> Self {
        if calls.is_empty() {
            return Self {
                total_calls: 0,
                total_duration_seconds: 0.0,
                average_duration_seconds: 0.0,
                min_duration_seconds: 0.0,
                max_duration_seconds: 0.0,
                total_tokens_used: 0,
            };
        }
        let stats = ServiceCallStats::from_calls(calls);
        let total_tokens_used = calls
            .iter()
            .filter_map(|c| c.metadata.get("tokens_used"))
            .filter_map(|v| v.as_u64())
            .sum();
        Self {
            total_calls: stats.total_calls,
            total_duration_seconds: stats.total_duration_seconds,
            average_duration_seconds: stats.average_duration_seconds,
            min_duration_seconds: stats.min_duration_seconds,
            max_duration_seconds: stats.max_duration_seconds,
            total_tokens_used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAggregate {
    pub total_calls: usize,
    pub total_duration_seconds: f64,
    pub average_duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalServiceStats {
    pub total_calls: usize,
    pub total_duration_seconds: f64,
    pub average_duration_seconds: f64,
    pub min_duration_seconds: f64,
    pub max_duration_seconds: f64,
    pub by_service: HashMap<String, ServiceAggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllServiceStats {
    pub llm: LlmStats,
    pub external_services: ExternalServiceStats,
    pub all_calls: ServiceCallStats,
}

/// Thread-safe log of outbound service calls.
pub struct ServiceCallTracker {
    clock: Arc<dyn Clock>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl ServiceCallTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn record_call(
        &self,
        service_name: impl Into<String>,
        operation: impl Into<String>,
        duration_seconds: f64,
        success: bool,
        error: Option<String>,
        metadata: HashMap<String, Value>,
    ) {
        let end_ms = self.clock.epoch_ms();
        let start_ms = end_ms.saturating_sub((duration_seconds * 1000.0) as u64);
        self.calls.lock().push(ServiceCall {
            service_name: service_name.into(),
            operation: operation.into(),
            start_ms,
            end_ms,
            duration_seconds,
            success,
            error,
            metadata,
        });
    }

    pub fn calls_by_service(&self, service_name: &str) -> Vec<ServiceCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.service_name == service_name)
            .cloned()
            .collect()
    }

    pub fn llm_calls(&self) -> Vec<ServiceCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| LLM_SERVICES.contains(&c.service_name.to_lowercase().as_str()))
            .cloned()
            .collect()
    }

    pub fn external_service_calls(&self) -> Vec<ServiceCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| EXTERNAL_SERVICES.contains(&c.service_name.to_lowercase().as_str()))
            .cloned()
            .collect()
    }

    pub fn service_statistics(&self, service_name: Option<&str>) -> ServiceCallStats {
        let calls = self.calls.lock();
        let filtered: Vec<&ServiceCall> = match service_name {
            Some(name) => calls.iter().filter(|c| c.service_name == name).collect(),
            None => calls.iter().collect(),
        };
        ServiceCallStats::from_calls(&filtered)
    }

    pub fn llm_statistics(&self) -> LlmStats {
        let calls = self.llm_calls();
        LlmStats::from_calls(&calls.iter().collect::<Vec<_>>())
    }

    pub fn external_service_statistics(&self) -> ExternalServiceStats {
        let calls = self.external_service_calls();
        if calls.is_empty() {
            return ExternalServiceStats {
                total_calls: 0,
                total_duration_seconds: 0.0,
                average_duration_seconds: 0.0,
                min_duration_seconds: 0.0,
                max_duration_seconds: 0.0,
                by_service: HashMap::new(),
            };
        }
        let refs: Vec<&ServiceCall> = calls.iter().collect();
        let stats = ServiceCallStats::from_calls(&refs);

        let mut by_service: HashMap<String, ServiceAggregate> = HashMap::new();
        for name in calls.iter().map(|c| c.service_name.clone()).collect::<std::collections::BTreeSet<_>>() {
            let service_calls: Vec<&ServiceCall> = calls.iter().filter(|c| c.service_name == name).collect();
            let service_stats = ServiceCallStats::from_calls(&service_calls);
            by_service.insert(
                name,
                ServiceAggregate {
                    total_calls: service_stats.total_calls,
                    total_duration_seconds: service_stats.total_duration_seconds,
                    average_duration_seconds: service_stats.average_duration_seconds,
                },
            );
        }

        ExternalServiceStats {
            total_calls: stats.total_calls,
            total_duration_seconds: stats.total_duration_seconds,
            average_duration_seconds: stats.average_duration_seconds,
            min_duration_seconds: stats.min_duration_seconds,
            max_duration_seconds: stats.max_duration_seconds,
            by_service,
        }
    }

    pub fn all_statistics(&self) -> AllServiceStats {
        AllServiceStats {
            llm: self.llm_statistics(),
            external_services: self.external_service_statistics(),
            all_calls: self.service_statistics(None),
        }
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

#[cfg(test)]
#[path = "service_call_tracker_tests.rs"]
mod tests;
