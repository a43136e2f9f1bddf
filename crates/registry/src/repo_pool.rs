// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace Pool Allocator HTTP client. Grounded on
//! `original_source/necrocode/agent_runner/repo_pool_client.py`'s
//! `RepoPoolClient`: allocate/release/status against the pool's slot
//! endpoints (spec.md §6, Workspace Manager's acquisition path).

use crate::retry::send_with_retry;
use rn_core::{RetryPolicy, RunnerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
struct AllocateRequest<'a> {
    repo_url: &'a str,
    required_by: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SlotAllocation {
    pub slot_id: String,
    pub slot_path: String,
}

pub struct RepoPoolClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl RepoPoolClient {
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

    pub async fn allocate_slot(
        &self,
        repo_url: &str,
        required_by: &str,
        timeout_seconds: Option<u64>,
    ) -> Result<SlotAllocation, RunnerError> {
        let url = format!("{}/slots/allocate", self.base_url);
        info!(service = "repo_pool", operation = "allocate_slot", repo_url, required_by, "allocating workspace slot");

        let payload = AllocateRequest {
            repo_url,
            required_by,
            timeout_seconds,
        };

        let response = send_with_retry(
            || self.http.post(&url).timeout(self.timeout).json(&payload),
            &self.retry_policy,
            "allocate_slot",
        )
        .await
        .map_err(|message| RunnerError::ResourceConflict { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ResourceConflict {
            message: format!("allocate_slot returned error status: {err}"),
        })?;

        response.json().await.map_err(|err| RunnerError::ResourceConflict {
            message: format!("failed to parse slot allocation: {err}"),
        })
    }

    pub async fn release_slot(&self, slot_id: &str) -> Result<(), RunnerError> {
        let url = format!("{}/slots/{slot_id}/release", self.base_url);
        info!(service = "repo_pool", operation = "release_slot", slot_id, "releasing workspace slot");

        send_with_retry(
            || self.http.post(&url).timeout(self.timeout),
            &self.retry_policy,
            "release_slot",
        )
        .await
        .map_err(|message| RunnerError::ResourceConflict { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ResourceConflict {
            message: format!("release_slot returned error status: {err}"),
        })?;
        Ok(())
    }

    pub async fn get_slot_status(&self, slot_id: &str) -> Result<Value, RunnerError> {
        let url = format!("{}/slots/{slot_id}", self.base_url);
        let response = send_with_retry(
            || self.http.get(&url).timeout(self.timeout),
            &self.retry_policy,
            "get_slot_status",
        )
        .await
        .map_err(|message| RunnerError::ResourceConflict { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ResourceConflict {
            message: format!("get_slot_status returned error status: {err}"),
        })?;

        response.json().await.map_err(|err| RunnerError::ResourceConflict {
            message: format!("failed to parse slot status: {err}"),
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
#[path = "repo_pool_tests.rs"]
mod tests;
