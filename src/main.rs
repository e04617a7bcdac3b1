mod config;
mod db;
mod error;
mod grading;
mod ipc;
mod model;
mod records;
mod repo;
mod report;
mod stats;
mod threshold;
mod validate;

use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    // stdout carries the protocol; logs go to stderr.
    let filter = EnvFilter::try_from_env("RESULTSD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn initial_state(cfg: &config::DaemonConfig) -> ipc::AppState {
    let role = match cfg.role.as_deref() {
        Some(raw) => ipc::Role::parse(raw).unwrap_or_else(|| {
            tracing::warn!(role = raw, "unknown RESULTSD_ROLE, falling back to admin");
            ipc::Role::Admin
        }),
        None => ipc::Role::Admin,
    };
    let mut state = ipc::AppState {
        workspace: None,
        db: None,
        role,
    };
    if let Some(path) = cfg.workspace.clone() {
        if let Err(e) = ipc::select_workspace(&mut state, path) {
            tracing::error!(error = %e, "could not open RESULTSD_WORKSPACE");
        }
    }
    state
}

fn main() {
    init_logging();
    let cfg = config::DaemonConfig::from_env();
    let mut state = initial_state(&cfg);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), role = state.role.as_str(), "resultsd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparsable request line");
                let resp = ipc::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, exiting");
}
