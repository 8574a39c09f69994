//! Pure reducer folding realtime post events into a feed snapshot.
//!
//! Clients apply optimistic updates locally and reconcile against the event
//! stream. The fold must therefore tolerate out-of-order and unknown-post
//! events: an update for a post not in the snapshot is ignored, a create for
//! a post already present overwrites it, counters are taken from the event
//! verbatim (the server's row is authoritative, the local value is not).

use std::collections::BTreeMap;

use serde_json::Value;

use super::events;

/// The client-visible slice of a post that events carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPost {
    pub id: String,
    pub likes_count: i32,
    pub comments_count: i32,
    pub status: String,
}

/// A feed snapshot keyed by post id.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedState {
    pub posts: BTreeMap<String, FeedPost>,
}

impl FeedState {
    /// Fold one event into the snapshot. Unknown event names are ignored.
    pub fn apply(&mut self, event_name: &str, data: &Value) {
        let Some(id) = data.get("id").and_then(Value::as_str) else {
            return;
        };

        match event_name {
            events::POST_CREATE => {
                self.posts.insert(id.to_string(), feed_post(id, data));
            }
            events::POST_UPDATE => {
                // An update for a post we never saw is a hint we can't use.
                if let Some(existing) = self.posts.get_mut(id) {
                    let fresh = feed_post(id, data);
                    existing.likes_count = fresh.likes_count;
                    existing.comments_count = fresh.comments_count;
                    existing.status = fresh.status;
                }
            }
            events::POST_DELETE => {
                self.posts.remove(id);
            }
            _ => {}
        }
    }
}

fn feed_post(id: &str, data: &Value) -> FeedPost {
    FeedPost {
        id: id.to_string(),
        likes_count: data
            .get("likes_count")
            .and_then(Value::as_i64)
            .unwrap_or(0) as i32,
        comments_count: data
            .get("comments_count")
            .and_then(Value::as_i64)
            .unwrap_or(0) as i32,
        status: data
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("approved")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_then_update_tracks_counters() {
        let mut state = FeedState::default();
        state.apply(
            events::POST_CREATE,
            &json!({ "id": "post_1", "likes_count": 0, "comments_count": 0, "status": "approved" }),
        );
        state.apply(
            events::POST_UPDATE,
            &json!({ "id": "post_1", "likes_count": 2, "comments_count": 1, "status": "approved" }),
        );

        let post = &state.posts["post_1"];
        assert_eq!(post.likes_count, 2);
        assert_eq!(post.comments_count, 1);
    }

    #[test]
    fn update_for_unknown_post_is_ignored() {
        let mut state = FeedState::default();
        state.apply(events::POST_UPDATE, &json!({ "id": "post_x", "likes_count": 5 }));
        assert!(state.posts.is_empty());
    }

    #[test]
    fn delete_before_create_is_tolerated() {
        let mut state = FeedState::default();
        state.apply(events::POST_DELETE, &json!({ "id": "post_1" }));
        state.apply(
            events::POST_CREATE,
            &json!({ "id": "post_1", "likes_count": 0, "comments_count": 0, "status": "pending" }),
        );
        assert_eq!(state.posts["post_1"].status, "pending");
    }

    #[test]
    fn stale_counter_update_is_overwritten_by_the_next_authoritative_one() {
        // Two updates arriving in either order converge on whichever the
        // store reported last; the reducer never sums deltas itself.
        let mut state = FeedState::default();
        state.apply(
            events::POST_CREATE,
            &json!({ "id": "post_1", "likes_count": 4, "comments_count": 0, "status": "approved" }),
        );
        state.apply(
            events::POST_UPDATE,
            &json!({ "id": "post_1", "likes_count": 3, "comments_count": 0, "status": "approved" }),
        );
        assert_eq!(state.posts["post_1"].likes_count, 3);
    }

    #[test]
    fn malformed_events_are_dropped() {
        let mut state = FeedState::default();
        state.apply(events::POST_CREATE, &json!({ "likes_count": 1 }));
        state.apply("SOMETHING_ELSE", &json!({ "id": "post_1" }));
        assert!(state.posts.is_empty());
    }
}
