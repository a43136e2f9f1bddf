// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Registry HTTP client. Grounded on
//! `original_source/necrocode/agent_runner/task_registry_client.py`'s
//! `TaskRegistryClient`: same four operations, same URL shapes, same
//! request/response bodies (spec.md §6).

use crate::retry::send_with_retry;
use rn_core::{RetryPolicy, RunnerError};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
struct StatusUpdate<'a> {
    status: &'a str,
    metadata: &'a HashMap<String, Value>,
    updated_at: f64,
}

#[derive(Debug, Clone, Serialize)]
struct EventPayload<'a> {
    event_type: &'a str,
    data: &'a Value,
    timestamp: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ArtifactPayload<'a> {
    #[serde(rename = "type")]
    artifact_type: &'a str,
    uri: &'a str,
    size_bytes: u64,
    metadata: &'a HashMap<String, Value>,
    created_at: f64,
}

pub struct TaskRegistryClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl TaskRegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            timeout,
            retry_policy: RetryPolicy::network_default(),
        }
    }

    pub async fn update_task_status(
        &self,
        task_id: &str,
        status: &str,
        metadata: &HashMap<String, Value>,
        now_epoch_secs: f64,
    ) -> Result<(), RunnerError> {
        let url = format!("{}/tasks/{task_id}/status", self.base_url);
        info!(service = "task_registry", operation = "update_task_status", task_id, status, %url, "updating task status");

        let payload = StatusUpdate {
            status,
            metadata,
            updated_at: now_epoch_secs,
        };

        send_with_retry(
            || self.http.put(&url).timeout(self.timeout).json(&payload),
            &self.retry_policy,
            "update_task_status",
        )
        .await
        .map_err(|message| RunnerError::ResourceConflict { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ResourceConflict {
            message: format!("update_task_status returned error status: {err}"),
        })?;
        Ok(())
    }

    pub async fn add_event(
        &self,
        task_id: &str,
        event_type: &str,
        data: &Value,
        now_epoch_secs: f64,
    ) -> Result<(), RunnerError> {
        let url = format!("{}/tasks/{task_id}/events", self.base_url);
        debug!(service = "task_registry", operation = "add_event", task_id, event_type, "adding event");

        let payload = EventPayload {
            event_type,
            data,
            timestamp: now_epoch_secs,
        };

        send_with_retry(
            || self.http.post(&url).timeout(self.timeout).json(&payload),
            &self.retry_policy,
            "add_event",
        )
        .await
        .map_err(|message| RunnerError::ResourceConflict { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ResourceConflict {
            message: format!("add_event returned error status: {err}"),
        })?;
        Ok(())
    }

    pub async fn add_artifact(
        &self,
        task_id: &str,
        artifact_type: &str,
        uri: &str,
        size_bytes: u64,
        metadata: &HashMap<String, Value>,
        now_epoch_secs: f64,
    ) -> Result<(), RunnerError> {
        let url = format!("{}/tasks/{task_id}/artifacts", self.base_url);
        info!(service = "task_registry", operation = "add_artifact", task_id, artifact_type, size_bytes, "adding artifact");

        let payload = ArtifactPayload {
            artifact_type,
            uri,
            size_bytes,
            metadata,
            created_at: now_epoch_secs,
        };

        send_with_retry(
            || self.http.post(&url).timeout(self.timeout).json(&payload),
            &self.retry_policy,
            "add_artifact",
        )
        .await
        .map_err(|message| RunnerError::ArtifactUpload { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ArtifactUpload {
            message: format!("add_artifact returned error status: {err}"),
        })?;
        Ok(())
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Value, RunnerError> {
        let url = format!("{}/tasks/{task_id}", self.base_url);
        let response = send_with_retry(
            || self.http.get(&url).timeout(self.timeout),
            &self.retry_policy,
            "get_task",
        )
        .await
        .map_err(|message| RunnerError::ResourceConflict { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ResourceConflict {
            message: format!("get_task returned error status: {err}"),
        })?;

        response.json().await.map_err(|err| RunnerError::ResourceConflict {
            message: format!("failed to parse task response: {err}"),
        })
    }

    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        matches!(
            self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await,
            Ok(response) if response.status().is_success()
        )
    }
}

#[cfg(test)]
#[path = "task_registry_tests.rs"]
mod tests;
