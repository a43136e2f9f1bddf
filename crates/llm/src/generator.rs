// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::model::GenerationResult;
use async_trait::async_trait;
use rn_core::RunnerError;
use std::path::Path;

/// The LLM code generator contract the Orchestrator's Implement phase
/// calls against. Rate-limit, timeout, and connection errors are retried
/// internally by the implementation; a malformed response is terminal.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate_code(
        &self,
        prompt: &str,
        workspace_path: &Path,
        max_tokens: Option<u32>,
    ) -> Result<GenerationResult, RunnerError>;
}
