// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swlaned`: the agent orchestration daemon.
//!
//! Two processes share this binary. The supervisor (the default) forks a
//! worker (`DAEMON_WORKER=1`) and restarts it within a windowed budget;
//! the worker owns the store, the multiplexer driver, the RPC router, and
//! the background monitor loops. Architecture grounded on the teacher's
//! listener-task-plus-engine-loop split (`daemon/src/main.rs`), adapted
//! here to a supervisor/worker process split instead of a single process
//! with an in-process listener task, since this system's restart
//! semantics operate at the process level (spec §4.11).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;
use swimlane_adapters::{LocalShell, TmuxMuxDriver};
use swimlane_daemon::config::Config;
use swimlane_daemon::state::AppState;
use swimlane_daemon::{api, supervisor};
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> std::io::Result<()> {
    let config = Config::load().unwrap_or_else(|err| {
        eprintln!("swlaned: failed to load configuration: {err}");
        std::process::exit(1);
    });

    if !supervisor::is_worker() {
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(supervisor::run(&config));
    }

    let _log_guard = setup_logging(&config);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_worker(config))
}

async fn run_worker(config: Config) -> std::io::Result<()> {
    info!("starting worker");

    std::fs::create_dir_all(&config.data_dir)?;
    let store = Arc::new(swimlane_storage::Store::open(&config.db_path).await);
    let driver: Arc<dyn swimlane_adapters::MuxDriver> = Arc::new(TmuxMuxDriver::new(LocalShell));
    let config = Arc::new(config);
    let state = AppState::new(store.clone(), driver.clone(), config.clone());

    if config.reconcile_on_start {
        let clock = state.clock.clone();
        let (recovered, orphaned) =
            swimlane_engine::reconcile_on_startup(&store, driver.as_ref(), &state.orchestrator, &clock).await;
        info!(recovered, orphaned, "startup reconciliation complete");
    }

    if config.enable_auto_monitor {
        spawn_monitor_loops(&state);
    }

    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    let unix_listener = UnixListener::bind(&config.socket_path)?;
    info!(path = %config.socket_path.display(), "listening on unix socket");
    tokio::spawn(api::socket::serve(unix_listener, state.clone()));

    let http_router = api::http::router(state.clone());
    let http_addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let http_listener = tokio::net::TcpListener::bind(http_addr).await?;
    info!(addr = %http_addr, "listening on http");
    tokio::spawn(async move {
        if let Err(err) = axum::serve(http_listener, http_router).await {
            error!(error = %err, "http server stopped");
        }
    });

    wait_for_shutdown(&state).await;

    info!("flushing store before exit");
    store.flush_now().await;
    let _ = std::fs::remove_file(&config.socket_path);
    info!("worker stopped");
    Ok(())
}

/// Waits for whichever shutdown trigger fires first: `daemon.shutdown`
/// over RPC, or a signal forwarded from the supervisor.
async fn wait_for_shutdown(state: &Arc<AppState>) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            warn!(error = %err, "failed to install SIGTERM handler");
            state.shutdown.notified().await;
            return;
        }
    };

    tokio::select! {
        _ = state.shutdown.notified() => info!("shutdown requested via daemon.shutdown"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }
}

fn spawn_monitor_loops(state: &Arc<AppState>) {
    let interval = std::time::Duration::from_millis(state.config.auto_monitor_interval_ms);

    spawn_tick_loop("auto-monitor", interval, state.clone(), |state| {
        let monitor = state.auto_monitor();
        async move { monitor.tick().await }
    });
    spawn_tick_loop("auto-pilot", interval, state.clone(), |state| {
        let pilot = state.auto_pilot();
        async move { pilot.tick().await }
    });
    spawn_tick_loop("auto-close", interval, state.clone(), |state| {
        let closer = state.auto_close();
        async move { closer.tick().await }
    });
    spawn_tick_loop("session-sync", interval, state.clone(), |state| {
        let sync = state.session_sync();
        async move { sync.tick().await }
    });
}

/// Runs `make_tick(state)` on a fixed interval forever, logging how many
/// items each tick touched. One loop per monitor (spec §5 "monitors are
/// independent ... may interleave arbitrarily").
fn spawn_tick_loop<F, Fut>(name: &'static str, interval: std::time::Duration, state: Arc<AppState>, make_tick: F)
where
    F: Fn(Arc<AppState>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = usize> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let touched = make_tick(state.clone()).await;
            if touched > 0 {
                tracing::debug!(monitor = name, touched, "monitor tick");
            }
        }
    });
}

fn setup_logging(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if let Some(parent) = config.log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        config.log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("daemon.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Some(guard)
}
