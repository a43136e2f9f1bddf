// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Orchestrator: holds references to the other six components for
//! the lifetime of one Runner process and drives a single `TaskContext`
//! through the full Run protocol.

use crate::config::OrchestratorConfig;
use parking_lot::Mutex;
use rn_core::snapshot::write_atomic;
use rn_core::{
    Artifact, ArtifactKind, Clock, Event, ImplementationResult, PushResult, RunnerError,
    RunnerId, RunnerResult, RunnerState, RunnerStateSnapshot, SystemClock, TaskContext,
    TestResult, Workspace,
};
use rn_coordinator::{CoordinationGuard, Coordinator};
use rn_llm::CodeGenerator;
use rn_monitor::{ExecutionMonitor, ResourceLimits, DEFAULT_SAMPLE_INTERVAL};
use rn_registry::{ArtifactStoreClient, CurrentTask, HealthStatus, TaskRegistryClient};
use rn_security::{CredentialStore, PermissionGate};
use rn_vcs::WorkspaceManager;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Default)]
struct RunOutputs {
    implementation: Option<ImplementationResult>,
    tests: Option<TestResult>,
    push: Option<PushResult>,
    artifacts: Vec<Artifact>,
}

/// Owns the Workspace Manager, Coordinator, Credential Store, code
/// generator, and the two registry HTTP clients for as long as this
/// Runner process lives. A unique `runner_id` is generated once, at
/// construction.
pub struct Orchestrator {
    runner_id: RunnerId,
    workspace_manager: WorkspaceManager,
    coordinator: Option<Arc<Coordinator>>,
    credential_store: Arc<CredentialStore>,
    code_generator: Arc<dyn CodeGenerator>,
    task_registry: Arc<TaskRegistryClient>,
    artifact_store: Arc<ArtifactStoreClient>,
    health: Option<HealthStatus>,
    clock: Arc<dyn Clock>,
    config: OrchestratorConfig,
    state: Mutex<RunnerStateSnapshot>,
    log_lines: Mutex<Vec<String>>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runner_id: RunnerId,
        workspace_manager: WorkspaceManager,
        coordinator: Option<Arc<Coordinator>>,
        credential_store: Arc<CredentialStore>,
        code_generator: Arc<dyn CodeGenerator>,
        task_registry: Arc<TaskRegistryClient>,
        artifact_store: Arc<ArtifactStoreClient>,
        health: Option<HealthStatus>,
        config: OrchestratorConfig,
    ) -> Self {
        Self::with_clock(
            runner_id,
            workspace_manager,
            coordinator,
            credential_store,
            code_generator,
            task_registry,
            artifact_store,
            health,
            config,
            Arc::new(SystemClock),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_clock(
        runner_id: RunnerId,
        workspace_manager: WorkspaceManager,
        coordinator: Option<Arc<Coordinator>>,
        credential_store: Arc<CredentialStore>,
        code_generator: Arc<dyn CodeGenerator>,
        task_registry: Arc<TaskRegistryClient>,
        artifact_store: Arc<ArtifactStoreClient>,
        health: Option<HealthStatus>,
        config: OrchestratorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.epoch_ms();
        let state = RunnerStateSnapshot::new(runner_id.clone(), now);
        Self {
            runner_id,
            workspace_manager,
            coordinator,
            credential_store,
            code_generator,
            task_registry,
            artifact_store,
            health,
            clock,
            config,
            state: Mutex::new(state),
            log_lines: Mutex::new(Vec::new()),
        }
    }

    pub fn runner_id(&self) -> &RunnerId {
        &self.runner_id
    }

    pub fn state(&self) -> RunnerState {
        self.state.lock().state
    }

    /// Resets a terminal runner back to `Idle` so it can accept another
    /// task. Not called internally by `run` — the binary driving the
    /// Runner loop calls this between tasks.
    pub fn reset(&self) -> Result<(), RunnerError> {
        self.transition_state(RunnerState::Idle, None)
    }

    /// Drives `task_context` through workspace prep, implementation,
    /// testing, commit & push, artifact upload, and completion
    /// reporting. Never panics: every failure mode is folded into a
    /// `RunnerResult { success: false, .. }`.
    pub async fn run(&self, task_context: TaskContext) -> RunnerResult {
        let started = Instant::now();

        if let Err(e) = task_context.validate() {
            return self.failed_result(&task_context, &e, started.elapsed().as_secs_f64(), 0);
        }

        let (concurrent_runners, guard) = self.admit(&task_context).await;

        if let Err(e) = self.transition_state(RunnerState::Running, Some(&task_context)) {
            return self.failed_result(
                &task_context,
                &e,
                started.elapsed().as_secs_f64(),
                concurrent_runners,
            );
        }
        self.emit_tracked(
            &task_context,
            Event::TaskStarted {
                task_id: task_context.task_id.clone(),
                at_ms: self.clock.epoch_ms(),
            },
        )
        .await;

        let monitor = ExecutionMonitor::with_clock(
            self.clock.clone(),
            task_context.timeout_seconds,
            ResourceLimits {
                max_memory_mb: self.config.max_memory_mb,
                max_cpu_percent: self.config.max_cpu_percent,
            },
            DEFAULT_SAMPLE_INTERVAL,
        );
        monitor.start();

        let mut outputs = RunOutputs::default();
        let outcome = self
            .run_phases(&task_context, &monitor, &mut outputs, started, concurrent_runners)
            .await;

        monitor.stop();

        let final_result = match outcome {
            Ok(result) => {
                let _ = self.transition_state(RunnerState::Completed, Some(&task_context));
                result
            }
            Err(e) => {
                let masked_message = self.credential_store.mask(&e.to_string());
                self.log(format!("task failed: {masked_message}"));
                self.attempt_error_artifact_upload(&task_context, &mut outputs).await;
                let _ = self.transition_state(RunnerState::Failed, Some(&task_context));
                self.emit_tracked(
                    &task_context,
                    Event::TaskFailed {
                        task_id: task_context.task_id.clone(),
                        error_kind: e.kind().to_string(),
                        message: masked_message.clone(),
                        at_ms: self.clock.epoch_ms(),
                    },
                )
                .await;
                self.build_result(
                    &task_context,
                    false,
                    Some(masked_message),
                    started.elapsed().as_secs_f64(),
                    concurrent_runners,
                    &task_context.slot_path,
                    &outputs,
                )
            }
        };

        drop(guard);
        self.credential_store.clear();
        if final_result.success {
            self.clear_state_snapshot();
        }
        final_result
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_phases(
        &self,
        task_context: &TaskContext,
        monitor: &ExecutionMonitor,
        outputs: &mut RunOutputs,
        started: Instant,
        concurrent_runners: u32,
    ) -> Result<RunnerResult, RunnerError> {
        monitor.check()?;
        self.log_event(&Event::TaskAdvanced {
            task_id: task_context.task_id.clone(),
            phase: "prepare_workspace".to_string(),
            at_ms: self.clock.epoch_ms(),
        });
        let workspace = self.prepare_workspace(task_context).await?;

        monitor.check()?;
        self.log_event(&Event::TaskAdvanced {
            task_id: task_context.task_id.clone(),
            phase: "implement".to_string(),
            at_ms: self.clock.epoch_ms(),
        });
        let implementation = self.implement(task_context, &workspace).await?;
        outputs.implementation = Some(implementation);

        monitor.check()?;
        self.log_event(&Event::TaskAdvanced {
            task_id: task_context.task_id.clone(),
            phase: "test".to_string(),
            at_ms: self.clock.epoch_ms(),
        });
        let tests = crate::test_runner::run_tests(
            &workspace.path,
            task_context.test_commands.as_deref(),
            task_context.fail_fast,
        )
        .await;
        let tests_passed = tests.success;
        let failed_count = tests.failed_count();
        let ran_count = tests.results.len();
        outputs.tests = Some(tests);
        if !tests_passed {
            return Err(RunnerError::TestFailed {
                message: format!("{failed_count} of {ran_count} test command(s) failed"),
            });
        }

        monitor.check()?;
        self.log_event(&Event::TaskAdvanced {
            task_id: task_context.task_id.clone(),
            phase: "commit_and_push".to_string(),
            at_ms: self.clock.epoch_ms(),
        });
        let push = self.commit_and_push(task_context, &workspace).await?;
        outputs.push = Some(push);

        monitor.check()?;
        self.log_event(&Event::TaskAdvanced {
            task_id: task_context.task_id.clone(),
            phase: "upload_artifacts".to_string(),
            at_ms: self.clock.epoch_ms(),
        });
        self.upload_artifacts(task_context, &workspace, outputs).await;

        monitor.check()?;
        self.log_event(&Event::TaskAdvanced {
            task_id: task_context.task_id.clone(),
            phase: "report_completion".to_string(),
            at_ms: self.clock.epoch_ms(),
        });
        let elapsed = started.elapsed().as_secs_f64();
        let result = self.build_result(
            task_context,
            true,
            None,
            elapsed,
            concurrent_runners,
            &workspace.path,
            outputs,
        );
        self.report_completion(task_context, &result).await;

        Ok(result)
    }

    async fn admit(&self, task_context: &TaskContext) -> (u32, Option<CoordinationGuard>) {
        let Some(coordinator) = self.coordinator.clone() else {
            return (0, None);
        };

        let wait_ms = coordinator.wait_time_ms();
        if wait_ms > 0 {
            let capped = wait_ms.min(self.config.admission_wait_cap.as_millis() as u64);
            self.log(format!("coordinator admission wait: {capped}ms"));
            tokio::time::sleep(std::time::Duration::from_millis(capped)).await;
        }

        let registered = coordinator.register(
            self.runner_id.clone(),
            task_context.task_id.clone(),
            task_context.spec_name.clone(),
            task_context.slot_path.display().to_string(),
        );
        let concurrent_runners = coordinator.concurrent_count();

        let guard = if registered {
            Some(CoordinationGuard::new(coordinator, self.runner_id.clone()))
        } else {
            warn!(
                task_id = %task_context.task_id,
                "coordinator registration failed, proceeding in degraded (uncoordinated) mode"
            );
            None
        };
        (concurrent_runners, guard)
    }

    async fn prepare_workspace(&self, task_context: &TaskContext) -> Result<Workspace, RunnerError> {
        let gate = PermissionGate::new(task_context.slot_path.clone());
        match self
            .workspace_manager
            .prepare(
                &task_context.slot_path,
                &task_context.branch_name,
                &self.config.base_branch,
                &gate,
            )
            .await
        {
            Ok(workspace) => {
                if let Some(coordinator) = &self.coordinator {
                    coordinator.update_resources(
                        &self.runner_id,
                        None,
                        Some(vec![task_context.branch_name.clone()]),
                    );
                    for conflict in coordinator.detect_conflicts(
                        &self.runner_id,
                        &[],
                        std::slice::from_ref(&task_context.branch_name),
                    ) {
                        warn!(%conflict, "resource conflict detected after claiming workspace branch");
                    }
                }
                Ok(workspace)
            }
            Err(e) => {
                let recovery = Workspace::new(
                    task_context.slot_path.clone(),
                    self.config.base_branch.clone(),
                    self.config.base_branch.clone(),
                );
                if let Err(rollback_err) = self.workspace_manager.rollback(&recovery).await {
                    warn!(error = %rollback_err, "workspace rollback after preparation failure also failed");
                }
                Err(e)
            }
        }
    }

    async fn implement(
        &self,
        task_context: &TaskContext,
        workspace: &Workspace,
    ) -> Result<ImplementationResult, RunnerError> {
        let phase_started = Instant::now();
        let prompt = crate::prompt::build_implementation_prompt(
            task_context,
            &workspace.path,
            self.config.workspace_tree_max_depth,
            self.config.related_file_max_bytes,
        );

        let generation = match self
            .code_generator
            .generate_code(&prompt, &workspace.path, self.config.max_llm_tokens)
            .await
        {
            Ok(generation) => {
                self.update_service_health("llm_service", true);
                generation
            }
            Err(e) => {
                self.update_service_health("llm_service", false);
                return Err(e);
            }
        };

        let gate = PermissionGate::new(workspace.path.clone());
        let files_changed = crate::changes::apply_code_changes(&generation.code_changes, &gate)?;

        Ok(ImplementationResult {
            success: true,
            duration_seconds: phase_started.elapsed().as_secs_f64(),
            files_changed,
            explanation: generation.explanation,
            model: generation.model,
            tokens_used: generation.tokens_used,
        })
    }

    async fn commit_and_push(
        &self,
        task_context: &TaskContext,
        workspace: &Workspace,
    ) -> Result<PushResult, RunnerError> {
        let gate = PermissionGate::new(workspace.path.clone());
        let message = format!(
            "feat({}): {} [Task {}]",
            task_context.spec_name, task_context.title, task_context.task_id
        );
        self.workspace_manager
            .commit_changes(workspace, &message, &gate)
            .await?;
        self.workspace_manager
            .push_branch(workspace, &task_context.branch_name, &gate)
            .await
    }

    async fn upload_artifacts(
        &self,
        task_context: &TaskContext,
        workspace: &Workspace,
        outputs: &mut RunOutputs,
    ) {
        let now = self.clock.epoch_ms();

        match self.workspace_manager.get_diff(workspace).await {
            Ok(diff) if !diff.trim().is_empty() => {
                self.try_upload_artifact(task_context, ArtifactKind::Diff, diff.into_bytes(), now, outputs)
                    .await;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to compute workspace diff for artifact upload"),
        }

        let log_text = self.masked_log_text();
        self.try_upload_artifact(task_context, ArtifactKind::Log, log_text.into_bytes(), now, outputs)
            .await;

        if let Some(tests) = outputs.tests.clone() {
            if let Ok(json) = serde_json::to_vec(&tests) {
                self.try_upload_artifact(task_context, ArtifactKind::Test, json, now, outputs)
                    .await;
            }
        }
    }

    async fn attempt_error_artifact_upload(&self, task_context: &TaskContext, outputs: &mut RunOutputs) {
        let now = self.clock.epoch_ms();
        let log_text = self.masked_log_text();
        self.try_upload_artifact(task_context, ArtifactKind::Log, log_text.into_bytes(), now, outputs)
            .await;
    }

    async fn try_upload_artifact(
        &self,
        task_context: &TaskContext,
        kind: ArtifactKind,
        content: Vec<u8>,
        now_ms: u64,
        outputs: &mut RunOutputs,
    ) {
        let size_bytes = content.len() as u64;
        let type_str = artifact_kind_str(kind);
        match self
            .artifact_store
            .upload(type_str, content, &Value::Object(Default::default()))
            .await
        {
            Ok(uri) => {
                self.update_service_health("artifact_store", true);
                let artifact = Artifact {
                    kind,
                    uri: uri.clone(),
                    size_bytes,
                    metadata: HashMap::new(),
                    created_at_ms: now_ms,
                };
                let now_epoch_secs = now_ms as f64 / 1000.0;
                match self
                    .task_registry
                    .add_artifact(
                        task_context.task_id.as_str(),
                        type_str,
                        &uri,
                        size_bytes,
                        &HashMap::new(),
                        now_epoch_secs,
                    )
                    .await
                {
                    Ok(()) => self.update_service_health("task_registry", true),
                    Err(e) => {
                        self.update_service_health("task_registry", false);
                        warn!(error = %e, "failed to record artifact in task registry");
                    }
                }
                self.log_event(&Event::ArtifactUploaded {
                    task_id: task_context.task_id.clone(),
                    artifact: artifact.clone(),
                    at_ms: now_ms,
                });
                outputs.artifacts.push(artifact);
            }
            Err(e) => {
                self.update_service_health("artifact_store", false);
                warn!(error = %e, artifact_type = type_str, "artifact upload failed, continuing");
            }
        }
    }

    async fn report_completion(&self, task_context: &TaskContext, result: &RunnerResult) {
        let now_epoch_secs = self.clock.epoch_ms() as f64 / 1000.0;
        match self
            .task_registry
            .update_task_status(task_context.task_id.as_str(), "done", &HashMap::new(), now_epoch_secs)
            .await
        {
            Ok(()) => self.update_service_health("task_registry", true),
            Err(e) => {
                self.update_service_health("task_registry", false);
                warn!(error = %e, "failed to report task completion to registry");
            }
        }
        self.emit_tracked(
            task_context,
            Event::TaskCompleted {
                task_id: task_context.task_id.clone(),
                result: Box::new(result.clone()),
                at_ms: self.clock.epoch_ms(),
            },
        )
        .await;
    }

    fn build_result(
        &self,
        task_context: &TaskContext,
        success: bool,
        error: Option<String>,
        duration_seconds: f64,
        concurrent_runners: u32,
        workspace_path: &Path,
        outputs: &RunOutputs,
    ) -> RunnerResult {
        RunnerResult {
            task_id: task_context.task_id.clone(),
            success,
            error,
            duration_seconds,
            implementation: outputs.implementation.clone(),
            tests: outputs.tests.clone(),
            push: outputs.push.clone(),
            artifacts: outputs.artifacts.clone(),
            concurrent_runners,
            workspace_path: workspace_path.to_path_buf(),
        }
    }

    fn failed_result(
        &self,
        task_context: &TaskContext,
        error: &RunnerError,
        duration_seconds: f64,
        concurrent_runners: u32,
    ) -> RunnerResult {
        self.build_result(
            task_context,
            false,
            Some(self.credential_store.mask(&error.to_string())),
            duration_seconds,
            concurrent_runners,
            &task_context.slot_path,
            &RunOutputs::default(),
        )
    }

    fn transition_state(
        &self,
        next: RunnerState,
        task_context: Option<&TaskContext>,
    ) -> Result<(), RunnerError> {
        let now = self.clock.epoch_ms();
        {
            let mut snapshot = self.state.lock();
            snapshot.advance(next, now)?;
            if let Some(tc) = task_context {
                snapshot.task_id = Some(tc.task_id.as_str().to_string());
                snapshot.spec_name = Some(tc.spec_name.clone());
                snapshot.workspace_path = Some(tc.slot_path.display().to_string());
                if next == RunnerState::Running {
                    snapshot.start_time = Some(now);
                }
            }
            if let Some(dir) = &self.config.state_dir {
                let path = dir.join(format!("{}.json", self.runner_id));
                if let Err(e) = write_atomic(&path, &*snapshot) {
                    warn!(error = %e, "failed to persist runner state snapshot");
                }
            }
        }
        self.update_health_for_transition(next, task_context);
        Ok(())
    }

    /// Mirrors the original orchestrator's `update_status` calls around
    /// its Running/Completed/Failed transitions; `Idle` has no
    /// corresponding call there, so this leaves the health endpoint's
    /// last-reported state untouched on reset.
    fn update_health_for_transition(&self, next: RunnerState, task_context: Option<&TaskContext>) {
        let Some(health) = &self.health else {
            return;
        };
        let current_task = task_context.map(|tc| CurrentTask {
            task_id: tc.task_id.as_str().to_string(),
            spec_name: tc.spec_name.clone(),
        });
        match next {
            RunnerState::Running => health.update(true, "running", current_task),
            RunnerState::Completed => health.update(true, "completed", None),
            RunnerState::Failed => health.update(false, "failed", None),
            RunnerState::Idle => {}
        }
    }

    /// Deletes the on-disk state snapshot. Only called after a clean
    /// `Completed` transition; a `Failed` run leaves its snapshot in
    /// place for operator inspection.
    fn clear_state_snapshot(&self) {
        if let Some(dir) = &self.config.state_dir {
            let path = dir.join(format!("{}.json", self.runner_id));
            let _ = std::fs::remove_file(&path);
        }
    }

    fn update_service_health(&self, service_name: &str, healthy: bool) {
        if let Some(health) = &self.health {
            health.update_service_status(service_name, healthy);
        }
    }

    fn log(&self, message: impl Into<String>) {
        let masked = self.credential_store.mask(&message.into());
        let now = self.clock.epoch_ms();
        self.log_lines.lock().push(format!("[{now}] {masked}"));
    }

    fn masked_log_text(&self) -> String {
        self.log_lines.lock().join("\n")
    }

    fn log_event(&self, event: &Event) {
        info!(target: "rn_orchestrator::event", ?event, "runner event");
        self.log(format!("{event:?}"));
    }

    /// Logs locally and reports to the Task Registry. Reserved for the
    /// three event kinds spec.md's external-interfaces section names as
    /// registry-bound: `TaskStarted`, `TaskCompleted`, `TaskFailed`.
    async fn emit_tracked(&self, task_context: &TaskContext, event: Event) {
        self.log_event(&event);
        let event_type = match &event {
            Event::TaskStarted { .. } => "task_started",
            Event::TaskCompleted { .. } => "task_completed",
            Event::TaskFailed { .. } => "task_failed",
            Event::TaskAdvanced { .. } => "task_advanced",
            Event::ArtifactUploaded { .. } => "artifact_uploaded",
        };
        let data = serde_json::to_value(&event).unwrap_or(Value::Null);
        let now_epoch_secs = self.clock.epoch_ms() as f64 / 1000.0;
        match self
            .task_registry
            .add_event(task_context.task_id.as_str(), event_type, &data, now_epoch_secs)
            .await
        {
            Ok(()) => self.update_service_health("task_registry", true),
            Err(e) => {
                self.update_service_health("task_registry", false);
                warn!(error = %e, event_type, "failed to report event to task registry");
            }
        }
    }
}

fn artifact_kind_str(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Diff => "diff",
        ArtifactKind::Log => "log",
        ArtifactKind::Test => "test",
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
