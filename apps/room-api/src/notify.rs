//! Notification fan-out.
//!
//! Every notification is a best-effort side effect of some triggering
//! operation: a failed insert is logged and swallowed so the like, comment,
//! or badge award that caused it still stands.

use chrono::Utc;
use diesel::prelude::*;
use room_common::id;

use crate::db::schema::notifications;
use crate::models::notification::NewNotification;
use crate::realtime::events;
use crate::AppState;

/// Create a notification row and dispatch a realtime hint to the recipient.
///
/// Self-actions are skipped: you don't get notified for liking your own
/// post.
pub async fn fan_out(
    state: &AppState,
    recipient_id: &str,
    actor_id: Option<&str>,
    type_: &str,
    message: &str,
    post_id: Option<&str>,
) {
    if actor_id == Some(recipient_id) {
        return;
    }

    let notification_id = id::prefixed_ulid(id::prefix::NOTIFICATION);

    let result = async {
        let mut conn = state.db.get().await?;
        diesel_async::RunQueryDsl::execute(
            diesel::insert_into(notifications::table).values(NewNotification {
                id: &notification_id,
                recipient_id,
                actor_id,
                type_,
                message,
                post_id,
                is_read: false,
                created_at: Utc::now(),
            }),
            &mut conn,
        )
        .await?;
        Ok::<(), crate::error::ApiError>(())
    }
    .await;

    match result {
        Ok(()) => {
            state.broadcast.dispatch(
                events::Audience::User(recipient_id.to_string()),
                events::NOTIFICATION_CREATE,
                serde_json::json!({
                    "id": notification_id,
                    "recipient_id": recipient_id,
                    "actor_id": actor_id,
                    "type": type_,
                    "message": message,
                    "post_id": post_id,
                }),
            );
        }
        Err(err) => {
            // Never propagate: the triggering operation already succeeded.
            tracing::warn!(?err, %recipient_id, type_, "notification fan-out failed");
        }
    }
}
