// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging sink & format setup, grounded on the daemon's own
//! `setup_logging`: an `EnvFilter` seeded from `log_level`, a
//! non-blocking file appender when `log_file` is set, otherwise stderr,
//! with an optional JSON (structured) formatter.

use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Holds the non-blocking writer guard alive for the process lifetime;
/// dropping it stops flushing.
pub struct LoggingGuard(#[allow(dead_code)] Option<tracing_appender::non_blocking::WorkerGuard>);

/// Initializes the global tracing subscriber from the Runner's process
/// environment configuration. Must be called at most once per process.
pub fn init(log_level: &str, structured: bool, log_file: Option<&Path>) -> LoggingGuard {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_file) = log_file else {
        let registry = tracing_subscriber::registry().with(filter);
        if structured {
            registry.with(fmt::layer().json()).init();
        } else {
            registry.with(fmt::layer()).init();
        }
        return LoggingGuard(None);
    };

    if let Some(parent) = log_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    let file_name = log_file.file_name().unwrap_or_else(|| log_file.as_os_str());
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let registry = tracing_subscriber::registry().with(filter);
    if structured {
        registry.with(fmt::layer().json().with_writer(non_blocking)).init();
    } else {
        registry.with(fmt::layer().with_writer(non_blocking)).init();
    }
    LoggingGuard(Some(guard))
}
