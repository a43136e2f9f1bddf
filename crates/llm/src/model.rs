// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rn_core::CodeChange;
use serde::Deserialize;

/// The fixed JSON shape the Implement phase's prompt instructs the model to
/// answer in: `{code_changes: [{file_path, operation, content}], explanation}`.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponseBody {
    #[serde(default)]
    pub code_changes: Vec<CodeChange>,
    #[serde(default)]
    pub explanation: String,
}

/// Result of one `GenerateCode` call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub code_changes: Vec<CodeChange>,
    pub explanation: String,
    pub model: String,
    pub tokens_used: u64,
}
