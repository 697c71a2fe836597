// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event bus (spec §4.10): a broadcast channel every RPC transport's
//! `GET /events`/socket subscriber taps into, and the concrete
//! [`swimlane_engine::EventSink`] the launcher and monitors publish
//! through. Unlike the teacher's WAL-backed bus (`oj-daemon::event_bus`,
//! durable for crash-recovery replay), this bus is purely in-memory —
//! durability for this system lives in the store (spec §4.1), not in
//! event replay, so a plain `tokio::sync::broadcast` channel is the right
//! tool rather than carrying over the teacher's WAL machinery.

use swimlane_core::Event;
use swimlane_engine::EventSink;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// A fresh subscription; every subscriber gets every event published
    /// from this point on (spec §4.10 "subscribes to every event-bus
    /// event").
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) {
        // No subscribers is not an error — the daemon may be starting up
        // or every client may have disconnected.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: Event) {
        self.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(Event::Info { message: "hi".to_string() });
        let received = rx.try_recv().unwrap();
        assert_eq!(received.name(), "info");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(Event::Info { message: "hi".to_string() });
    }
}
