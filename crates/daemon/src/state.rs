// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state threaded through every RPC handler and API
//! transport (spec §4.9's "flat namespace of method names dispatched to
//! typed handlers" needs one place holding the subsystems those handlers
//! delegate to).

use crate::config::Config;
use crate::event_bus::EventBus;
use std::sync::Arc;
use swimlane_adapters::MuxDriver;
use swimlane_core::{Clock, SystemClock};
use swimlane_engine::{health, AutoClose, AutoMonitor, AutoPilot, HealthReport, Launcher, Orchestrator, SessionSync};
use swimlane_storage::Store;
use tokio::sync::Notify;

pub struct AppState {
    pub store: Arc<Store>,
    pub driver: Arc<dyn MuxDriver>,
    pub clock: SystemClock,
    pub events: Arc<EventBus>,
    pub orchestrator: Arc<Orchestrator<SystemClock>>,
    pub launcher: Arc<Launcher<SystemClock>>,
    pub config: Arc<Config>,
    pub started_at_epoch_ms: u64,
    /// Signaled by `daemon.shutdown`; `main.rs`'s top-level select loop
    /// awaits this alongside the OS signal handlers.
    pub shutdown: Arc<Notify>,
}

impl AppState {
    pub fn new(store: Arc<Store>, driver: Arc<dyn MuxDriver>, config: Arc<Config>) -> Arc<Self> {
        let clock = SystemClock;
        let events: Arc<EventBus> = Arc::new(EventBus::new());
        let orchestrator = Arc::new(Orchestrator::new(store.clone(), clock.clone()));
        let launcher = Arc::new(Launcher::new(store.clone(), driver.clone(), clock.clone(), events.clone()));

        for runtime in &config.runtimes {
            store.save_runtime(runtime.clone());
        }

        Arc::new(Self {
            store,
            driver,
            started_at_epoch_ms: clock.epoch_ms(),
            clock,
            events,
            orchestrator,
            launcher,
            config,
            shutdown: Arc::new(Notify::new()),
        })
    }

    pub async fn health_report(&self) -> HealthReport {
        let runtimes = self.store.list_runtimes();
        health::check_health(&self.store, self.driver.as_ref(), &runtimes, &self.clock, self.started_at_epoch_ms).await
    }

    pub fn auto_monitor(&self) -> AutoMonitor<SystemClock> {
        AutoMonitor::new(
            self.store.clone(),
            self.driver.clone(),
            self.clock.clone(),
            self.events.clone(),
            self.launcher.clone(),
        )
    }

    pub fn auto_pilot(&self) -> AutoPilot {
        AutoPilot::new(self.store.clone(), self.driver.clone())
    }

    pub fn auto_close(&self) -> AutoClose<SystemClock> {
        AutoClose::new(self.store.clone(), self.driver.clone(), self.clock.clone())
    }

    pub fn session_sync(&self) -> SessionSync<SystemClock> {
        SessionSync::new(self.store.clone(), self.driver.clone(), self.clock.clone())
    }
}
