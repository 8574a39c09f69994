//! Follow-graph endpoints.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::{current_profile, AuthUser};
use crate::db::schema::follows;
use crate::error::{is_unique_violation, ApiError, ApiErrorBody, FieldError};
use crate::models::follow::NewFollow;
use crate::models::profile;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/follow", put(toggle_follow))
        .route("/users/{user_id}/follows", get(follow_counts))
}

// ---------------------------------------------------------------------------
// PUT /api/v1/users/:user_id/follow
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowResponse {
    /// True when the edge now exists, false when the toggle removed it.
    pub following: bool,
    pub followers_count: i64,
}

/// Toggle the follow edge from the caller to the target. Removes the edge if
/// it exists, otherwise creates it.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/follow",
    tag = "Social",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Toggle result", body = FollowResponse),
        (status = 400, description = "Cannot follow yourself", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody),
    ),
)]
pub async fn toggle_follow(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    let me = current_profile(&state, &auth).await?;

    if me.id == user_id {
        return Err(ApiError::validation(vec![FieldError {
            field: "user_id".to_string(),
            message: "You cannot follow yourself".to_string(),
        }]));
    }

    profile::find(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut conn = state.db.get().await?;

    // Delete-first toggle: a concurrent duplicate insert lands on the
    // composite primary key and reads back as already-following.
    let removed = diesel_async::RunQueryDsl::execute(
        diesel::delete(
            follows::table
                .filter(follows::follower_id.eq(&me.id))
                .filter(follows::following_id.eq(&user_id)),
        ),
        &mut conn,
    )
    .await?;

    let following = if removed > 0 {
        false
    } else {
        let insert = diesel_async::RunQueryDsl::execute(
            diesel::insert_into(follows::table).values(NewFollow {
                follower_id: &me.id,
                following_id: &user_id,
                created_at: Utc::now(),
            }),
            &mut conn,
        )
        .await;

        match insert {
            Ok(_) => true,
            Err(err) if is_unique_violation(&err) => true,
            Err(err) => return Err(err.into()),
        }
    };

    let followers_count: i64 = diesel_async::RunQueryDsl::get_result(
        follows::table
            .filter(follows::following_id.eq(&user_id))
            .count(),
        &mut conn,
    )
    .await?;

    Ok(Json(FollowResponse {
        following,
        followers_count,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/users/:user_id/follows
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowCountsResponse {
    pub followers_count: i64,
    pub following_count: i64,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/follows",
    tag = "Social",
    responses(
        (status = 200, description = "Follower and following counts", body = FollowCountsResponse),
        (status = 404, description = "User not found", body = ApiErrorBody),
    ),
)]
pub async fn follow_counts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FollowCountsResponse>, ApiError> {
    profile::find(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut conn = state.db.get().await?;

    let followers_count: i64 = diesel_async::RunQueryDsl::get_result(
        follows::table
            .filter(follows::following_id.eq(&user_id))
            .count(),
        &mut conn,
    )
    .await?;

    let following_count: i64 = diesel_async::RunQueryDsl::get_result(
        follows::table
            .filter(follows::follower_id.eq(&user_id))
            .count(),
        &mut conn,
    )
    .await?;

    Ok(Json(FollowCountsResponse {
        followers_count,
        following_count,
    }))
}
