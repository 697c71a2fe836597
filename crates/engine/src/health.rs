// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health checker (spec §4.12): store latency plus per-runtime reachability.

use std::sync::Arc;
use std::time::{Duration, Instant};
use swimlane_adapters::MuxDriver;
use swimlane_core::{Clock, Runtime, RuntimeKind};
use swimlane_storage::Store;

const SSH_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const SSH_OVERALL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub name: String,
    pub status: Status,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub overall: Status,
    pub timestamp: u64,
    pub uptime_ms: u64,
    pub components: Vec<ComponentHealth>,
}

fn fold_overall(components: &[ComponentHealth]) -> Status {
    if components.iter().any(|c| c.status == Status::Unhealthy) {
        Status::Unhealthy
    } else if components.iter().any(|c| c.status == Status::Degraded) {
        Status::Degraded
    } else {
        Status::Healthy
    }
}

async fn check_store(store: &Store) -> ComponentHealth {
    let start = Instant::now();
    let _ = store.list_lanes();
    let latency = start.elapsed();
    let status = if latency > Duration::from_millis(250) {
        Status::Degraded
    } else {
        Status::Healthy
    };
    ComponentHealth {
        name: "store".to_string(),
        status,
        message: None,
        latency_ms: Some(latency.as_millis() as u64),
    }
}

async fn check_runtime(driver: &dyn MuxDriver, runtime: &Runtime) -> ComponentHealth {
    let name = format!("runtime:{}", runtime.id.as_str());
    let probe = match runtime.kind {
        RuntimeKind::LocalTmux => "tmux -V",
        RuntimeKind::Docker => "docker info",
        RuntimeKind::K8s => "kubectl cluster-info",
        RuntimeKind::Ssh => "true",
    };
    let timeout = if runtime.kind == RuntimeKind::Ssh {
        SSH_OVERALL_TIMEOUT
    } else {
        SSH_CONNECT_TIMEOUT
    };

    let result = tokio::time::timeout(timeout, driver.exec_command(probe)).await;
    match result {
        Ok(Ok(out)) if out.success => ComponentHealth {
            name,
            status: Status::Healthy,
            message: None,
            latency_ms: None,
        },
        Ok(Ok(out)) => ComponentHealth {
            name,
            status: Status::Unhealthy,
            message: Some(out.stderr),
            latency_ms: None,
        },
        Ok(Err(err)) => ComponentHealth {
            name,
            status: Status::Unhealthy,
            message: Some(err.to_string()),
            latency_ms: None,
        },
        Err(_) => ComponentHealth {
            name,
            status: Status::Unhealthy,
            message: Some("reachability probe timed out".to_string()),
            latency_ms: None,
        },
    }
}

/// Runs the full health report (spec §4.12): store latency plus one
/// reachability check per configured runtime.
pub async fn check_health(
    store: &Store,
    driver: &dyn MuxDriver,
    runtimes: &[Runtime],
    clock: &impl Clock,
    started_at_epoch_ms: u64,
) -> HealthReport {
    let mut components = vec![check_store(store).await];
    for runtime in runtimes {
        components.push(check_runtime(driver, runtime).await);
    }
    let now = clock.epoch_ms();
    HealthReport {
        overall: fold_overall(&components),
        timestamp: now,
        uptime_ms: now.saturating_sub(started_at_epoch_ms),
        components,
    }
}

/// Shared handle a daemon builds once at startup and passes to the RPC
/// layer's `daemon.health` handler.
pub struct HealthChecker<C: Clock> {
    store: Arc<Store>,
    driver: Arc<dyn MuxDriver>,
    runtimes: Vec<Runtime>,
    clock: C,
    started_at_epoch_ms: u64,
}

impl<C: Clock> HealthChecker<C> {
    pub fn new(store: Arc<Store>, driver: Arc<dyn MuxDriver>, runtimes: Vec<Runtime>, clock: C) -> Self {
        let started_at_epoch_ms = clock.epoch_ms();
        Self {
            store,
            driver,
            runtimes,
            clock,
            started_at_epoch_ms,
        }
    }

    pub async fn report(&self) -> HealthReport {
        check_health(&self.store, self.driver.as_ref(), &self.runtimes, &self.clock, self.started_at_epoch_ms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_adapters::FakeMuxDriver;
    use swimlane_core::FakeClock;

    #[tokio::test]
    async fn healthy_store_and_no_runtimes_is_healthy() {
        let store = Store::open_in_memory().await;
        let driver = FakeMuxDriver::new();
        let clock = FakeClock::new();
        let report = check_health(&store, &driver, &[], &clock, clock.epoch_ms()).await;
        assert_eq!(report.overall, Status::Healthy);
        assert_eq!(report.components.len(), 1);
    }

    #[tokio::test]
    async fn failing_exec_command_marks_runtime_unhealthy() {
        let store = Store::open_in_memory().await;
        let driver = FakeMuxDriver::new();
        driver.fail_next_exec();
        let clock = FakeClock::new();
        let runtime = Runtime::local();
        let report = check_health(&store, &driver, std::slice::from_ref(&runtime), &clock, 0).await;
        assert_eq!(report.overall, Status::Unhealthy);
    }
}
