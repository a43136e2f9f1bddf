// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assembles the seven components into one `Orchestrator`, reading the
//! process environment for every external-endpoint and credential
//! setting per spec.md §6's configuration table.

use rn_core::{RunnerError, RunnerId, SystemClock};
use rn_coordinator::Coordinator;
use rn_llm::{CodeGenerator, OpenAiCodeGenerator, OpenAiConfig};
use rn_orchestrator::{Orchestrator, OrchestratorConfig};
use rn_registry::{ArtifactStoreClient, HealthServer, HealthStatus, TaskRegistryClient};
use rn_security::CredentialStore;
use rn_vcs::WorkspaceManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A fully wired Runner process: the Orchestrator plus whatever
/// background services (health endpoint) were enabled by configuration.
pub struct Runner {
    pub orchestrator: Orchestrator,
    pub health_server: Option<HealthServer>,
}

/// Builds a `Runner` from the recognized process environment (`crate::config`).
pub async fn build(runner_id: RunnerId) -> Result<Runner, RunnerError> {
    if !crate::config::mask_secrets() {
        warn!("RN_MASK_SECRETS=false has no effect; secret masking is always enabled");
    }

    let credentials = Arc::new(CredentialStore::new());

    let llm_api_key_env_var = crate::config::llm_api_key_env_var();
    let llm_api_key = credentials.get_credential("llm_api_key", Some(llm_api_key_env_var.as_str()));

    let artifact_store_api_key_env_var = crate::config::artifact_store_api_key_env_var();
    let _artifact_store_api_key = credentials.get_credential(
        "artifact_store_api_key",
        Some(artifact_store_api_key_env_var.as_str()),
    );

    let git_token_env_var = crate::config::git_token_env_var();
    let _git_token = credentials.get_credential("git_token", Some(git_token_env_var.as_str()));

    let code_generator: Arc<dyn CodeGenerator> = match llm_api_key {
        Some(key) => {
            let mut openai_config = OpenAiConfig::new(key, crate::config::llm_model());
            openai_config.timeout = Duration::from_secs(crate::config::llm_timeout_seconds());
            openai_config.retry_policy = crate::config::network_retry_policy();
            if let Some(max_tokens) = crate::config::llm_max_tokens() {
                openai_config.default_max_tokens = max_tokens;
            }
            Arc::new(OpenAiCodeGenerator::new(openai_config))
        }
        None => {
            return Err(RunnerError::security(format!(
                "no LLM API key resolved from ${llm_api_key_env_var}"
            )));
        }
    };

    let workspace_manager = WorkspaceManager::new(crate::config::git_retry_policy());

    let coordinator = crate::config::coordination_dir().map(|dir| {
        Arc::new(
            Coordinator::new(dir)
                .with_max_parallel_runners(crate::config::max_parallel_runners()),
        )
    });

    let task_registry = Arc::new(TaskRegistryClient::new(crate::config::task_registry_url()));
    let artifact_store = Arc::new(ArtifactStoreClient::new(crate::config::artifact_store_url()));

    let state_dir = if crate::config::persist_state() {
        crate::config::state_file_path()
    } else {
        None
    };

    let orchestrator_config = OrchestratorConfig {
        max_memory_mb: crate::config::max_memory_mb(),
        max_cpu_percent: crate::config::max_cpu_percent(),
        state_dir,
        max_llm_tokens: crate::config::llm_max_tokens(),
        ..OrchestratorConfig::default()
    };

    let health = if crate::config::enable_health_check() {
        Some(HealthStatus::new(Arc::new(SystemClock), Some(runner_id.to_string())))
    } else {
        None
    };

    let orchestrator = Orchestrator::new(
        runner_id.clone(),
        workspace_manager,
        coordinator,
        credentials,
        code_generator,
        task_registry,
        artifact_store,
        health.clone(),
        orchestrator_config,
    );

    let health_server = if let Some(status) = health {
        let addr = SocketAddr::from(([0, 0, 0, 0], crate::config::health_check_port()));
        match HealthServer::bind(addr, status).await {
            Ok(server) => Some(server),
            Err(e) => {
                warn!(error = %e, "failed to bind health check server, continuing without it");
                None
            }
        }
    } else {
        None
    };

    Ok(Runner {
        orchestrator,
        health_server,
    })
}

#[cfg(test)]
#[path = "wiring_tests.rs"]
mod tests;
