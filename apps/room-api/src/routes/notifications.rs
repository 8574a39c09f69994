//! Notification inbox endpoints.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::db::schema::notifications;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::notification::Notification;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
}

// ---------------------------------------------------------------------------
// GET /api/v1/notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    /// Return notifications created before this id (exclusive).
    pub before: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationsPage {
    pub notifications: Vec<Notification>,
    pub has_more: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = NotificationsPage),
        (status = 401, description = "Not authenticated", body = ApiErrorBody),
    ),
)]
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<NotificationsPage>, ApiError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let mut conn = state.db.get().await?;

    let mut query = notifications::table
        .filter(notifications::recipient_id.eq(&auth.user_id))
        .order(notifications::id.desc())
        .limit(limit + 1)
        .select(Notification::as_select())
        .into_boxed();

    // Ids are ULIDs, so lexicographic order is creation order.
    if let Some(before) = params.before {
        query = query.filter(notifications::id.lt(before));
    }

    let mut rows: Vec<Notification> =
        diesel_async::RunQueryDsl::load(query, &mut conn).await?;

    let has_more = rows.len() as i64 > limit;
    rows.truncate(limit as usize);

    Ok(Json(NotificationsPage {
        notifications: rows,
        has_more,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/notifications/unread-count
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    tag = "Notifications",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Number of unread notifications", body = UnreadCountResponse),
    ),
)]
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let mut conn = state.db.get().await?;

    let unread_count: i64 = diesel_async::RunQueryDsl::get_result(
        notifications::table
            .filter(notifications::recipient_id.eq(&auth.user_id))
            .filter(notifications::is_read.eq(false))
            .count(),
        &mut conn,
    )
    .await?;

    Ok(Json(UnreadCountResponse { unread_count }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/notifications/read-all
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadAllResponse {
    pub marked_read: i64,
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All notifications marked read", body = ReadAllResponse),
    ),
)]
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ReadAllResponse>, ApiError> {
    let mut conn = state.db.get().await?;

    let marked = diesel_async::RunQueryDsl::execute(
        diesel::update(
            notifications::table
                .filter(notifications::recipient_id.eq(&auth.user_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true)),
        &mut conn,
    )
    .await?;

    Ok(Json(ReadAllResponse {
        marked_read: marked as i64,
    }))
}
