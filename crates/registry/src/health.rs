// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health and readiness HTTP endpoint. Grounded on
//! `original_source/necrocode/agent_runner/health_check.py`'s
//! `HealthStatus`/`HealthCheckServer`: same `/health` and `/ready` routes,
//! same JSON shape, same 200/503 status-code convention for Kubernetes-style
//! probes — served with `axum` rather than a hand-rolled `BaseHTTPRequestHandler`
//! loop, since the background-thread `HTTPServer` has no Rust-idiomatic
//! equivalent beyond an async router.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct CurrentTask {
    pub task_id: String,
    pub spec_name: String,
}

/// Mirrors `HealthStatus`: health, current task, and external-service
/// reachability, updated as the runner progresses.
#[derive(Debug, Clone)]
struct Inner {
    healthy: bool,
    runner_id: Option<String>,
    runner_state: String,
    current_task: Option<CurrentTask>,
    start_ms: u64,
    last_check_ms: u64,
    external_services: HashMap<String, bool>,
    details: HashMap<String, Value>,
}

impl Inner {
    fn new(runner_id: Option<String>, now_ms: u64) -> Self {
        Self {
            healthy: true,
            runner_id,
            runner_state: "idle".to_string(),
            current_task: None,
            start_ms: now_ms,
            last_check_ms: now_ms,
            external_services: HashMap::new(),
            details: HashMap::new(),
        }
    }

    fn to_json(&self, now_ms: u64) -> Value {
        json!({
            "status": if self.healthy { "healthy" } else { "unhealthy" },
            "runner_id": self.runner_id,
            "runner_state": self.runner_state,
            "current_task": self.current_task,
            "uptime_seconds": (now_ms.saturating_sub(self.start_ms)) as f64 / 1000.0,
            "last_check": self.last_check_ms,
            "external_services": self.external_services,
            "details": self.details,
        })
    }
}

/// Shared, mutable health state exposed over HTTP. Cheap to clone; every
/// clone observes the same underlying state.
#[derive(Clone)]
pub struct HealthStatus {
    clock: Arc<dyn rn_core::Clock>,
    inner: Arc<RwLock<Inner>>,
}

impl HealthStatus {
    pub fn new(clock: Arc<dyn rn_core::Clock>, runner_id: Option<String>) -> Self {
        let now_ms = clock.epoch_ms();
        Self {
            clock,
            inner: Arc::new(RwLock::new(Inner::new(runner_id, now_ms))),
        }
    }

    pub fn update(&self, healthy: bool, runner_state: &str, current_task: Option<CurrentTask>) {
        let mut inner = self.inner.write();
        inner.healthy = healthy;
        inner.runner_state = runner_state.to_string();
        inner.current_task = current_task;
        inner.last_check_ms = self.clock.epoch_ms();
    }

    pub fn update_service_status(&self, service_name: &str, healthy: bool) {
        let mut inner = self.inner.write();
        inner.external_services.insert(service_name.to_string(), healthy);
        inner.last_check_ms = self.clock.epoch_ms();
    }

    pub fn is_healthy(&self) -> bool {
        self.inner.read().healthy
    }

    pub fn runner_state(&self) -> String {
        self.inner.read().runner_state.clone()
    }

    fn to_dict(&self) -> Value {
        self.inner.read().to_json(self.clock.epoch_ms())
    }
}

async fn handle_health(State(status): State<HealthStatus>) -> impl IntoResponse {
    let healthy = status.is_healthy();
    let code = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(status.to_dict()))
}

async fn handle_ready(State(status): State<HealthStatus>) -> impl IntoResponse {
    let runner_state = status.runner_state();
    let ready = status.is_healthy() && matches!(runner_state.as_str(), "idle" | "completed");
    let code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(json!({"ready": ready, "runner_state": runner_state})))
}

fn router(status: HealthStatus) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/healthz", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/readiness", get(handle_ready))
        .with_state(status)
}

/// A running health server and its background task handle.
pub struct HealthServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl HealthServer {
    /// Binds immediately and serves in the background; `addr.port() == 0`
    /// lets the OS pick a free port (useful in tests).
    pub async fn bind(addr: SocketAddr, status: HealthStatus) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let app = router(status);

        let task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!(%err, "health server terminated unexpectedly");
            }
        });

        info!(addr = %local_addr, "health check server started");
        Ok(Self { addr: local_addr, task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
