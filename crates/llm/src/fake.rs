// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic test double for [`CodeGenerator`]. Grounded on
//! `FakeAgentAdapter`'s call-recording/canned-response pattern.

use crate::generator::CodeGenerator;
use crate::model::GenerationResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use rn_core::RunnerError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GenerateCodeCall {
    pub prompt: String,
    pub workspace_path: PathBuf,
    pub max_tokens: Option<u32>,
}

struct FakeState {
    calls: Vec<GenerateCodeCall>,
    response: Result<GenerationResult, String>,
}

/// Always returns a configured canned response and records every call.
#[derive(Clone)]
pub struct FakeCodeGenerator {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeCodeGenerator {
    pub fn new(response: GenerationResult) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                response: Ok(response),
            })),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                response: Err(message.into()),
            })),
        }
    }

    pub fn set_response(&self, response: GenerationResult) {
        self.inner.lock().response = Ok(response);
    }

    pub fn calls(&self) -> Vec<GenerateCodeCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl CodeGenerator for FakeCodeGenerator {
    async fn generate_code(
        &self,
        prompt: &str,
        workspace_path: &Path,
        max_tokens: Option<u32>,
    ) -> Result<GenerationResult, RunnerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(GenerateCodeCall {
            prompt: prompt.to_string(),
            workspace_path: workspace_path.to_path_buf(),
            max_tokens,
        });
        inner
            .response
            .clone()
            .map_err(|message| RunnerError::ImplementationFailed { message })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
