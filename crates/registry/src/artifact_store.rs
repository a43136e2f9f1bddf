// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact Store HTTP client. Grounded on
//! `original_source/necrocode/agent_runner/artifact_store_client.py`'s
//! `ArtifactStoreClient`: multipart upload, plain-GET download against
//! the opaque returned URI (not `base_url`), and metadata lookup
//! (spec.md §6).

use crate::retry::send_with_retry;
use rn_core::{RetryPolicy, RunnerError};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// 60s, twice the other two clients' default — uploads/downloads can carry
/// real artifact payloads rather than small JSON bodies.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ArtifactStoreClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl ArtifactStoreClient {
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

    /// Uploads `content` as a multipart body; returns the store's opaque URI.
    pub async fn upload(
        &self,
        artifact_type: &str,
        content: Vec<u8>,
        metadata: &Value,
    ) -> Result<String, RunnerError> {
        let url = format!("{}/artifacts", self.base_url);
        info!(service = "artifact_store", operation = "upload", artifact_type, bytes = content.len(), "uploading artifact");

        let metadata_json = serde_json::to_string(metadata).map_err(|err| RunnerError::ArtifactUpload {
            message: format!("failed to serialize artifact metadata: {err}"),
        })?;

        let response = send_with_retry(
            || {
                let form = Form::new()
                    .part("file", Part::bytes(content.clone()).file_name("artifact"))
                    .text("type", artifact_type.to_string())
                    .text("metadata", metadata_json.clone());
                self.http.post(&url).timeout(self.timeout).multipart(form)
            },
            &self.retry_policy,
            "upload",
        )
        .await
        .map_err(|message| RunnerError::ArtifactUpload { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ArtifactUpload {
            message: format!("upload returned error status: {err}"),
        })?;

        let body: Value = response.json().await.map_err(|err| RunnerError::ArtifactUpload {
            message: format!("failed to parse upload response: {err}"),
        })?;

        body.get("uri")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RunnerError::ArtifactUpload {
                message: "upload response missing 'uri' field".to_string(),
            })
    }

    pub async fn upload_text(
        &self,
        artifact_type: &str,
        content: &str,
        metadata: &Value,
    ) -> Result<String, RunnerError> {
        self.upload(artifact_type, content.as_bytes().to_vec(), metadata).await
    }

    /// Downloads from `uri` directly — the store returns an opaque,
    /// independently-addressable location, not a path under `base_url`.
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>, RunnerError> {
        let response = send_with_retry(
            || self.http.get(uri).timeout(self.timeout),
            &self.retry_policy,
            "download",
        )
        .await
        .map_err(|message| RunnerError::ArtifactUpload { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ArtifactUpload {
            message: format!("download returned error status: {err}"),
        })?;

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|err| RunnerError::ArtifactUpload {
                message: format!("failed to read download body: {err}"),
            })
    }

    pub async fn download_text(&self, uri: &str) -> Result<String, RunnerError> {
        let bytes = self.download(uri).await?;
        String::from_utf8(bytes).map_err(|err| RunnerError::ArtifactUpload {
            message: format!("downloaded artifact is not valid UTF-8: {err}"),
        })
    }

    pub async fn get_metadata(&self, uri: &str) -> Result<Value, RunnerError> {
        let url = format!("{}/artifacts/metadata", self.base_url);
        let response = send_with_retry(
            || self.http.get(&url).timeout(self.timeout).query(&[("uri", uri)]),
            &self.retry_policy,
            "get_metadata",
        )
        .await
        .map_err(|message| RunnerError::ArtifactUpload { message })?
        .error_for_status()
        .map_err(|err| RunnerError::ArtifactUpload {
            message: format!("get_metadata returned error status: {err}"),
        })?;

        response.json().await.map_err(|err| RunnerError::ArtifactUpload {
            message: format!("failed to parse artifact metadata: {err}"),
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
#[path = "artifact_store_tests.rs"]
mod tests;
