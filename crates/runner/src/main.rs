// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rn-runner: a worker process that executes one task at a time.
//!
//! Invocation: `rn-runner <task-context-path>`, where the path may be
//! `-` to read the JSON task descriptor from stdin. The dispatcher that
//! hands out task descriptors and schedules Runners across hosts is out
//! of scope for this binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use rn_core::{IdGen, RunnerId, UuidIdGen};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let arg = std::env::args().nth(1);

    let task_source = match arg.as_deref() {
        Some("--version") | Some("-V") | Some("-v") => {
            println!("rn-runner {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("--help") | Some("-h") | Some("help") => {
            print_help();
            return Ok(());
        }
        None => {
            print_help();
            eprintln!("error: missing required argument <task-context-path>");
            std::process::exit(1);
        }
        Some(path) => path.to_string(),
    };

    let _log_guard = rn_runner::logging::init(
        &rn_runner::config::log_level(),
        rn_runner::config::structured_logging(),
        rn_runner::config::log_file().as_deref(),
    );

    let runner_id = RunnerId::new(UuidIdGen.next());
    info!(%runner_id, "starting runner");

    let task_context = match rn_runner::task_source::load_task_context(&task_source) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "failed to load task context");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let runner = match rn_runner::wiring::build(runner_id.clone()).await {
        Ok(runner) => runner,
        Err(e) => {
            error!(error = %e, "failed to assemble runner components");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = runner.orchestrator.run(task_context).await;

    if let Some(server) = runner.health_server {
        server.stop();
    }

    let succeeded = result.success;
    match serde_json::to_string(&result) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "failed to serialize runner result"),
    }
    info!(success = succeeded, "runner finished");

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

fn print_help() {
    println!("rn-runner {}", env!("CARGO_PKG_VERSION"));
    println!("Task-execution worker for the automation platform's Runner fleet");
    println!();
    println!("USAGE:");
    println!("    rn-runner <task-context-path>");
    println!();
    println!("ARGS:");
    println!("    <task-context-path>    Path to a TaskContext JSON file, or - for stdin");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}
