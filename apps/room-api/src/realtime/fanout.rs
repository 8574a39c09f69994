//! Broadcast hub for dispatching realtime events to connected sessions.
//!
//! Uses a single `tokio::sync::broadcast` channel. Each connected session
//! subscribes and filters events locally by audience. This is sufficient for
//! a single-process deployment.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

use super::events::Audience;

/// Capacity of the broadcast channel. Slow receivers that fall behind will
/// skip messages (RecvError::Lagged).
const BROADCAST_CAPACITY: usize = 4096;

/// A payload broadcast to all connected realtime sessions.
#[derive(Debug, Clone)]
pub struct BroadcastPayload {
    pub audience: Audience,
    /// The dispatch event name (e.g. "POST_UPDATE").
    pub event_name: String,
    /// Serialized event data.
    pub data: Value,
}

/// The global broadcast hub. Cloneable — store in AppState.
#[derive(Clone)]
pub struct RealtimeBroadcast {
    sender: broadcast::Sender<Arc<BroadcastPayload>>,
}

impl RealtimeBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Subscribe to the broadcast channel. Each session calls this once to
    /// get its own receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BroadcastPayload>> {
        self.sender.subscribe()
    }

    /// Dispatch an event to all connected sessions.
    pub fn dispatch(&self, audience: Audience, event_name: &str, data: Value) {
        // send() returns Err if there are no receivers — that's fine.
        let _ = self.sender.send(Arc::new(BroadcastPayload {
            audience,
            event_name: event_name.to_string(),
            data,
        }));
    }
}

impl Default for RealtimeBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::events;

    #[tokio::test]
    async fn dispatch_reaches_subscribers() {
        let hub = RealtimeBroadcast::new();
        let mut rx = hub.subscribe();

        hub.dispatch(
            Audience::Global,
            events::POST_UPDATE,
            serde_json::json!({ "id": "post_1", "likes_count": 3 }),
        );

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload.event_name, events::POST_UPDATE);
        assert_eq!(payload.audience, Audience::Global);
        assert_eq!(payload.data["likes_count"], 3);
    }

    #[tokio::test]
    async fn dispatch_without_subscribers_is_a_noop() {
        let hub = RealtimeBroadcast::new();
        hub.dispatch(Audience::User("usr_a".into()), events::LEVEL_UP, serde_json::json!({}));
    }
}
