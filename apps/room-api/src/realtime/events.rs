//! Realtime event types and wire format.
//!
//! Events are best-effort hints for clients to refresh derived state; they
//! are never the source of truth for a write decision and may arrive out of
//! order relative to the HTTP responses that caused them.

use serde::Serialize;
use serde_json::Value;

pub const POST_CREATE: &str = "POST_CREATE";
pub const POST_UPDATE: &str = "POST_UPDATE";
pub const POST_DELETE: &str = "POST_DELETE";
pub const NOTIFICATION_CREATE: &str = "NOTIFICATION_CREATE";
pub const LEVEL_UP: &str = "LEVEL_UP";

/// Who should receive an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every connected session (feed-visible changes).
    Global,
    /// A single user's sessions (notifications, level-ups).
    User(String),
}

impl Audience {
    pub fn includes(&self, user_id: &str) -> bool {
        match self {
            Audience::Global => true,
            Audience::User(id) => id == user_id,
        }
    }
}

/// A message sent to the client over the realtime socket.
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeMessage {
    /// Event name (e.g. `POST_UPDATE`).
    pub t: String,
    /// Event payload.
    pub d: Value,
}
