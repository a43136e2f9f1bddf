// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios S1-S6, run against a real `Orchestrator` with
//! fake collaborators (LLM, registry HTTP, VCS via a PATH-shimmed `git`)
//! standing in for everything outside the process. S5 and S6 exercise
//! the Parallel Coordinator and Credential Store directly, since those
//! properties are about the collaborator itself rather than anything the
//! Orchestrator adds on top of it.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use rn_core::{
    ChangeOperation, CodeChange, Clock, FakeClock, RetryPolicy, RunnerError, RunnerId,
    RunnerState, SlotId, TaskContext, TaskId,
};
use rn_coordinator::Coordinator;
use rn_llm::{CodeGenerator, FakeCodeGenerator, GenerationResult};
use rn_orchestrator::{Orchestrator, OrchestratorConfig};
use rn_registry::{ArtifactStoreClient, TaskRegistryClient};
use rn_security::CredentialStore;
use rn_vcs::WorkspaceManager;
use serde_json::json;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serializes every test in this file that mutates process environment
/// (`PATH`, ad hoc credential env vars) — `cargo test` runs them
/// concurrently in one process by default.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn git(cwd: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("git runs");
    assert!(status.success(), "git {args:?} failed");
}

/// Bare "origin" plus a clone checked out on `main`, one commit so
/// `origin/main` exists.
fn git_fixture() -> (TempDir, PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let bare = root.path().join("origin.git");
    let clone = root.path().join("clone");
    git(root.path(), &["init", "--bare", "-b", "main", bare.to_str().unwrap()]);
    git(root.path(), &["clone", bare.to_str().unwrap(), clone.to_str().unwrap()]);
    std::fs::write(clone.join("README.md"), "hello\n").unwrap();
    git(&clone, &["add", "."]);
    git(&clone, &["commit", "-m", "initial"]);
    git(&clone, &["push", "-u", "origin", "main"]);
    (root, clone)
}

async fn mock_backends() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("PUT")).respond_with(ResponseTemplate::new(200)).mount(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uri": "https://store/artifacts/1"})))
        .mount(&server)
        .await;
    server
}

fn task_context(slot_path: &Path, branch_name: &str) -> TaskContext {
    TaskContext {
        task_id: TaskId::new("t-1"),
        spec_name: "widgets".to_string(),
        title: "Add a widget".to_string(),
        description: "Implement the widget factory.".to_string(),
        acceptance_criteria: vec![],
        dependencies: vec![],
        branch_name: branch_name.to_string(),
        slot_path: slot_path.to_path_buf(),
        slot_id: SlotId::new("slot-1"),
        playbook_path: None,
        test_commands: None,
        fail_fast: false,
        timeout_seconds: 30,
        complexity: None,
        require_review: false,
        metadata: Default::default(),
        related_files: vec![],
        required_skill: None,
    }
}

fn hello_generator() -> FakeCodeGenerator {
    FakeCodeGenerator::new(GenerationResult {
        code_changes: vec![CodeChange {
            file_path: PathBuf::from("hello.txt"),
            operation: ChangeOperation::Create,
            content: "hi".to_string(),
        }],
        explanation: "wrote hello.txt".to_string(),
        model: "fake-model".to_string(),
        tokens_used: 7,
    })
}

#[tokio::test]
async fn s1_happy_path_completes_with_one_diff_artifact_and_no_leftover_state() {
    // Every test that shells out to `git` shares this lock with S2, which
    // temporarily rewires PATH to a failing shim.
    let _lock = ENV_LOCK.lock().unwrap();
    let (_root, clone) = git_fixture();
    let server = mock_backends().await;
    let state_dir = tempfile::tempdir().unwrap();
    let runner_id = RunnerId::new("runner-s1");

    let orchestrator = Orchestrator::new(
        runner_id.clone(),
        WorkspaceManager::default(),
        None,
        Arc::new(CredentialStore::new()),
        Arc::new(hello_generator()),
        Arc::new(TaskRegistryClient::new(server.uri())),
        Arc::new(ArtifactStoreClient::new(server.uri())),
        None,
        OrchestratorConfig {
            state_dir: Some(state_dir.path().to_path_buf()),
            ..OrchestratorConfig::default()
        },
    );
    let ctx = task_context(&clone, "feature/task-1");

    let result = orchestrator.run(ctx).await;

    assert!(result.success, "expected success, got error: {:?}", result.error);
    let push = result.push.expect("push result recorded");
    assert_eq!(push.retry_count, 0);
    let diff_artifacts = result.artifacts.iter().filter(|a| a.kind == rn_core::ArtifactKind::Diff).count();
    assert_eq!(diff_artifacts, 1, "expected exactly one diff artifact, got {:?}", result.artifacts);
    assert_eq!(orchestrator.state(), RunnerState::Completed);

    let state_file = state_dir.path().join(format!("{runner_id}.json"));
    assert!(!state_file.exists(), "state snapshot should be cleared after a clean Completed run");
}

/// Shims `git` on `PATH` so `push` fails `fail_count` times before
/// succeeding, delegating every other subcommand to the real binary.
struct FlakyPushShim {
    _bin_dir: TempDir,
    previous_path: Option<String>,
}

impl FlakyPushShim {
    fn install(fail_count: u32) -> Self {
        let real_git = String::from_utf8(
            Command::new("sh").args(["-c", "command -v git"]).output().unwrap().stdout,
        )
        .unwrap()
        .trim()
        .to_string();

        let bin_dir = tempfile::tempdir().unwrap();
        let counter_file = bin_dir.path().join("push_attempts");
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"push\" ]; then\n\
             \x20\x20count=0\n\
             \x20\x20[ -f '{counter}' ] && count=$(cat '{counter}')\n\
             \x20\x20if [ \"$count\" -lt {fail_count} ]; then\n\
             \x20\x20\x20\x20count=$((count + 1))\n\
             \x20\x20\x20\x20echo \"$count\" > '{counter}'\n\
             \x20\x20\x20\x20echo 'simulated transient push failure' >&2\n\
             \x20\x20\x20\x20exit 1\n\
             \x20\x20fi\n\
             fi\n\
             exec '{real_git}' \"$@\"\n",
            counter = counter_file.display(),
            fail_count = fail_count,
            real_git = real_git,
        );
        let script_path = bin_dir.path().join("git");
        std::fs::write(&script_path, script).unwrap();
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let previous_path = std::env::var("PATH").ok();
        let new_path = match &previous_path {
            Some(p) => format!("{}:{p}", bin_dir.path().display()),
            None => bin_dir.path().display().to_string(),
        };
        std::env::set_var("PATH", new_path);

        Self { _bin_dir: bin_dir, previous_path }
    }
}

impl Drop for FlakyPushShim {
    fn drop(&mut self) {
        match self.previous_path.take() {
            Some(p) => std::env::set_var("PATH", p),
            None => std::env::remove_var("PATH"),
        }
    }
}

#[tokio::test]
async fn s2_push_retried_then_succeeds() {
    let _lock = ENV_LOCK.lock().unwrap();
    let (_root, clone) = git_fixture();
    let shim = FlakyPushShim::install(2);

    let server = mock_backends().await;
    let retry_policy = RetryPolicy::new(3, Duration::from_millis(30), Duration::from_secs(1), 2.0);
    let orchestrator = Orchestrator::new(
        RunnerId::new("runner-s2"),
        WorkspaceManager::new(retry_policy),
        None,
        Arc::new(CredentialStore::new()),
        Arc::new(hello_generator()),
        Arc::new(TaskRegistryClient::new(server.uri())),
        Arc::new(ArtifactStoreClient::new(server.uri())),
        None,
        OrchestratorConfig::default(),
    );
    let ctx = task_context(&clone, "feature/task-2");

    let result = orchestrator.run(ctx).await;
    drop(shim);

    assert!(result.success, "expected success, got error: {:?}", result.error);
    let push = result.push.expect("push result recorded");
    assert_eq!(push.retry_count, 2);
    assert!(
        push.duration_seconds >= 0.09,
        "push should have waited through two backoff delays (~90ms), took {}s",
        push.duration_seconds
    );
}

#[tokio::test]
async fn s3_permission_rejection_blocks_the_push_without_invoking_it() {
    let _lock = ENV_LOCK.lock().unwrap();
    let (_root, clone) = git_fixture();
    let server = mock_backends().await;
    let orchestrator = Orchestrator::new(
        RunnerId::new("runner-s3"),
        WorkspaceManager::default(),
        None,
        Arc::new(CredentialStore::new()),
        Arc::new(hello_generator()),
        Arc::new(TaskRegistryClient::new(server.uri())),
        Arc::new(ArtifactStoreClient::new(server.uri())),
        None,
        OrchestratorConfig::default(),
    );
    // "main" is the base branch, not a feature/task-prefixed branch, so
    // the gate rejects the push before any subprocess runs.
    let ctx = task_context(&clone, "main");

    let result = orchestrator.run(ctx).await;

    assert!(!result.success);
    assert!(result.push.is_none(), "no push result should be recorded");
    assert_eq!(orchestrator.state(), RunnerState::Failed);

    // The branch on the remote is untouched: only the initial commit.
    let log = Command::new("git")
        .args(["log", "--oneline", "origin/main"])
        .current_dir(&clone)
        .output()
        .unwrap();
    let line_count = String::from_utf8(log.stdout).unwrap().lines().count();
    assert_eq!(line_count, 1, "remote main should still carry only the fixture's initial commit");
}

struct SlowGenerator {
    clock: Arc<FakeClock>,
    advance_ms: u64,
    response: GenerationResult,
}

#[async_trait::async_trait]
impl CodeGenerator for SlowGenerator {
    async fn generate_code(
        &self,
        _prompt: &str,
        _workspace_path: &Path,
        _max_tokens: Option<u32>,
    ) -> Result<GenerationResult, RunnerError> {
        // Simulates slow LLM work by advancing the shared fake clock
        // rather than sleeping, so the deadline check at the next phase
        // boundary sees it deterministically and without a real wait.
        self.clock.advance(self.advance_ms);
        Ok(self.response.clone())
    }
}

#[tokio::test]
async fn s4_deadline_expiry_fails_the_task_with_a_timeout() {
    let _lock = ENV_LOCK.lock().unwrap();
    let (_root, clone) = git_fixture();
    let server = mock_backends().await;
    let clock = Arc::new(FakeClock::new(0));

    let generator = SlowGenerator {
        clock: clock.clone(),
        advance_ms: 3_000,
        response: GenerationResult {
            code_changes: vec![CodeChange {
                file_path: PathBuf::from("hello.txt"),
                operation: ChangeOperation::Create,
                content: "hi".to_string(),
            }],
            explanation: "wrote hello.txt".to_string(),
            model: "fake-model".to_string(),
            tokens_used: 7,
        },
    };

    let orchestrator = Orchestrator::with_clock(
        RunnerId::new("runner-s4"),
        WorkspaceManager::default(),
        None,
        Arc::new(CredentialStore::new()),
        Arc::new(generator),
        Arc::new(TaskRegistryClient::new(server.uri())),
        Arc::new(ArtifactStoreClient::new(server.uri())),
        None,
        OrchestratorConfig::default(),
        clock as Arc<dyn Clock>,
    );
    let mut ctx = task_context(&clone, "feature/task-4");
    ctx.timeout_seconds = 1;

    let result = orchestrator.run(ctx).await;

    assert!(!result.success);
    assert!(
        result.error.as_ref().unwrap().contains("deadline exceeded"),
        "expected a Timeout error, got {:?}",
        result.error
    );
    assert_eq!(orchestrator.state(), RunnerState::Failed);
}

#[tokio::test]
async fn s5_coordinator_rejects_path_collision_and_surfaces_branch_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = Coordinator::new(dir.path());
    let runner_a = RunnerId::new("runner-a");
    let runner_b = RunnerId::new("runner-b");

    assert!(coordinator.register(runner_a.clone(), TaskId::new("task-a"), "spec-a", "/w/1"));
    coordinator.update_resources(&runner_a, None, Some(vec!["feature/x".to_string()]));

    assert!(
        !coordinator.register(runner_b.clone(), TaskId::new("task-b"), "spec-b", "/w/1"),
        "B must not claim the same workspace path A already holds"
    );

    assert!(coordinator.register(runner_b.clone(), TaskId::new("task-b"), "spec-b", "/w/2"));
    let conflicts = coordinator.detect_conflicts(&runner_b, &[], &["feature/x".to_string()]);
    assert!(
        conflicts.iter().any(|c| c.contains("feature/x")),
        "expected a branch conflict naming feature/x, got {conflicts:?}"
    );
    assert_eq!(coordinator.concurrent_count(), 2, "both records coexist once paths differ");
}

#[tokio::test]
async fn s6_orchestrator_never_leaks_a_resolved_secret_into_the_run_result() {
    let _lock = ENV_LOCK.lock().unwrap();
    const ENV_VAR: &str = "RN_SCENARIOS_S6_TOKEN";
    let secret = "topsecretvalue1234";
    std::env::set_var(ENV_VAR, secret);

    let credentials = Arc::new(CredentialStore::new());
    credentials.get_credential("git_token", Some(ENV_VAR));
    std::env::remove_var(ENV_VAR);

    let (_root, clone) = git_fixture();
    let server = mock_backends().await;
    let failing = FakeCodeGenerator::failing(format!(
        "upstream rejected credential {secret} during generation"
    ));
    let orchestrator = Orchestrator::new(
        RunnerId::new("runner-s6"),
        WorkspaceManager::default(),
        None,
        credentials,
        Arc::new(failing),
        Arc::new(TaskRegistryClient::new(server.uri())),
        Arc::new(ArtifactStoreClient::new(server.uri())),
        None,
        OrchestratorConfig::default(),
    );
    let ctx = task_context(&clone, "feature/task-6");

    let result = orchestrator.run(ctx).await;

    assert!(!result.success);
    let error = result.error.expect("failure carries an error string");
    assert!(!error.contains(secret), "raw secret leaked into RunnerResult.error: {error}");
    assert!(error.contains("***"), "masked error should show a redaction marker: {error}");
}
