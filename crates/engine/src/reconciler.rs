// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup reconciliation (spec §4.8): on daemon boot, every agent that
//! wasn't already terminal is probed against its recorded multiplexer
//! location. Agents whose session is still alive are re-registered with the
//! orchestrator and have `lastActivityAt` refreshed; agents whose session is
//! gone are marked `error` rather than silently dropped, so a crash leaves
//! an auditable trail instead of erasing history.

use crate::orchestrator::Orchestrator;
use std::sync::Arc;
use swimlane_adapters::MuxDriver;
use swimlane_core::{Agent, AgentState, Clock};
use swimlane_storage::Store;
use tracing::{info, warn};

fn is_terminal(state: AgentState) -> bool {
    matches!(state, AgentState::Terminated | AgentState::Error)
}

async fn session_is_alive(driver: &dyn MuxDriver, agent: &Agent) -> bool {
    let Some(session_name) = agent.location.session_name.as_deref() else {
        return false;
    };
    driver.has_session(session_name).await.unwrap_or(false)
}

/// Runs the reconciliation pass. Returns the number of agents re-registered
/// as alive and the number marked `error`.
pub async fn reconcile_on_startup<C: Clock>(
    store: &Arc<Store>,
    driver: &dyn MuxDriver,
    orchestrator: &Orchestrator<C>,
    clock: &C,
) -> (usize, usize) {
    let mut recovered = 0usize;
    let mut orphaned = 0usize;

    for mut agent in store.list_agents() {
        if is_terminal(agent.state) {
            continue;
        }

        if session_is_alive(driver, &agent).await {
            agent.last_activity_at = clock.epoch_ms();
            info!(agent_id = %agent.id, "reconciled agent: session still alive");
            orchestrator.register_agent(agent);
            recovered += 1;
        } else {
            agent.state = AgentState::Error;
            agent.error_message = Some("multiplexer session not found at startup".to_string());
            agent.last_activity_at = clock.epoch_ms();
            warn!(agent_id = %agent.id, "reconciled agent: session missing, marking error");
            store.save_agent(agent);
            orphaned += 1;
        }
    }

    (recovered, orphaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swimlane_adapters::{FakeMuxDriver, NewSessionOpts};
    use swimlane_core::{AgentLocation, FakeClock, Provider};

    #[tokio::test]
    async fn agent_with_live_session_is_recovered_and_refreshed() {
        let store = Arc::new(Store::open_in_memory().await);
        let driver = FakeMuxDriver::new();
        driver.new_session("lane-a", NewSessionOpts::default()).await.unwrap();
        let clock = FakeClock::new();
        clock.advance(std::time::Duration::from_secs(60));
        let orchestrator = Orchestrator::new(store.clone(), clock.clone());

        let mut agent = Agent::new("a1", "coder", Provider::Claude, 0);
        agent.state = AgentState::Working;
        agent.location = AgentLocation {
            server_id: Some("local".to_string()),
            session_name: Some("lane-a".to_string()),
            window_index: Some(1),
            pane_index: Some(0),
        };
        let agent_id = agent.id.clone();
        store.save_agent(agent);

        let (recovered, orphaned) = reconcile_on_startup(&store, &driver, &orchestrator, &clock).await;
        assert_eq!(recovered, 1);
        assert_eq!(orphaned, 0);
        assert_eq!(store.get_agent(&agent_id).unwrap().last_activity_at, clock.epoch_ms());
    }

    #[tokio::test]
    async fn agent_with_dead_session_is_marked_error() {
        let store = Arc::new(Store::open_in_memory().await);
        let driver = FakeMuxDriver::new();
        let clock = FakeClock::new();
        let orchestrator = Orchestrator::new(store.clone(), clock.clone());

        let mut agent = Agent::new("a1", "coder", Provider::Claude, 0);
        agent.state = AgentState::Working;
        agent.location.session_name = Some("gone".to_string());
        let agent_id = agent.id.clone();
        store.save_agent(agent);

        let (recovered, orphaned) = reconcile_on_startup(&store, &driver, &orchestrator, &clock).await;
        assert_eq!(recovered, 0);
        assert_eq!(orphaned, 1);
        assert_eq!(store.get_agent(&agent_id).unwrap().state, AgentState::Error);
    }

    #[tokio::test]
    async fn terminal_agents_are_skipped() {
        let store = Arc::new(Store::open_in_memory().await);
        let driver = FakeMuxDriver::new();
        let clock = FakeClock::new();
        let orchestrator = Orchestrator::new(store.clone(), clock.clone());

        let mut agent = Agent::new("a1", "coder", Provider::Claude, 0);
        agent.state = AgentState::Terminated;
        store.save_agent(agent);

        let (recovered, orphaned) = reconcile_on_startup(&store, &driver, &orchestrator, &clock).await;
        assert_eq!(recovered, 0);
        assert_eq!(orphaned, 0);
    }
}
