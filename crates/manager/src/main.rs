// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vivd: run an indexing pipeline from a manifest.
//!
//! ```text
//! vivd <manifest.toml> [log-dir]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viv_core::SystemClock;
use viv_manager::{Manifest, ServiceManager};

fn init_tracing(log_dir: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vivd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(manifest_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: vivd <manifest.toml> [log-dir]");
        return ExitCode::from(2);
    };
    let log_dir = args.next().map(PathBuf::from);
    let _log_guard = init_tracing(log_dir.as_ref());

    let manifest = match Manifest::load(&manifest_path) {
        Ok(m) => m,
        Err(e) => {
            error!(path = %manifest_path.display(), error = %e, "failed to load manifest");
            return ExitCode::FAILURE;
        }
    };

    let manager = match ServiceManager::build(&manifest, SystemClock) {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, "failed to build pipeline");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = manager.start_all().await {
        error!(error = %e, "failed to start pipeline");
        manager.stop_all().await;
        return ExitCode::FAILURE;
    }
    info!(services = ?manager.service_names(), "pipeline running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "signal handler failed");
    }
    info!("shutting down");
    manager.stop_all().await;

    info!(status = %manager.pipeline_status(), "pipeline stopped");
    ExitCode::SUCCESS
}
