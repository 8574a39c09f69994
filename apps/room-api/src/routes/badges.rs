//! Badge catalog and per-user badge listings.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::{badges, user_badges};
use crate::error::{ApiError, ApiErrorBody};
use crate::models::badge::Badge;
use crate::models::profile;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/badges", get(list_badges))
        .route("/users/{user_id}/badges", get(list_user_badges))
}

// ---------------------------------------------------------------------------
// GET /api/v1/badges
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/badges",
    tag = "Progression",
    responses((status = 200, description = "The badge catalog", body = [Badge])),
)]
pub async fn list_badges(State(state): State<AppState>) -> Result<Json<Vec<Badge>>, ApiError> {
    let mut conn = state.db.get().await?;

    let rows: Vec<Badge> = diesel_async::RunQueryDsl::load(
        badges::table
            .order((badges::min_level.asc(), badges::id.asc()))
            .select(Badge::as_select()),
        &mut conn,
    )
    .await?;

    Ok(Json(rows))
}

// ---------------------------------------------------------------------------
// GET /api/v1/users/:user_id/badges
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct EarnedBadge {
    #[serde(flatten)]
    pub badge: Badge,
    pub awarded_at: chrono::DateTime<chrono::Utc>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/badges",
    tag = "Progression",
    responses(
        (status = 200, description = "Badges the user has earned", body = [EarnedBadge]),
        (status = 404, description = "User not found", body = ApiErrorBody),
    ),
)]
pub async fn list_user_badges(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EarnedBadge>>, ApiError> {
    profile::find(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut conn = state.db.get().await?;

    let rows: Vec<(Badge, chrono::DateTime<chrono::Utc>)> = diesel_async::RunQueryDsl::load(
        user_badges::table
            .inner_join(badges::table)
            .filter(user_badges::user_id.eq(&user_id))
            .order(user_badges::awarded_at.asc())
            .select((Badge::as_select(), user_badges::awarded_at)),
        &mut conn,
    )
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(badge, awarded_at)| EarnedBadge { badge, awarded_at })
            .collect(),
    ))
}
