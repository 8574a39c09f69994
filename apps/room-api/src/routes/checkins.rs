//! Daily check-in endpoints.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::{current_profile, AuthUser};
use crate::error::{ApiError, ApiErrorBody};
use crate::progression::service;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkins", post(perform_checkin))
        .route("/checkins/today", get(checkin_status))
}

// ---------------------------------------------------------------------------
// POST /api/v1/checkins
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckinResponse {
    /// False when the user had already checked in today (no-op).
    pub checked_in: bool,
    pub message: String,
    pub xp: i32,
    pub level: i32,
    pub leveled_up: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/checkins",
    tag = "Progression",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Check-in result", body = CheckinResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorBody),
    ),
)]
pub async fn perform_checkin(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CheckinResponse>, ApiError> {
    let profile = current_profile(&state, &auth).await?;

    let outcome = service::perform_daily_checkin(&state, &profile).await?;

    let (xp, level, leveled_up) = match &outcome.award {
        Some(award) => (award.xp, award.new_level, award.leveled_up()),
        None => (profile.xp, profile.level, false),
    };

    Ok(Json(CheckinResponse {
        checked_in: outcome.checked_in,
        message: outcome.message,
        xp,
        level,
        leveled_up,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/checkins/today
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckinStatusResponse {
    pub checked_in_today: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/checkins/today",
    tag = "Progression",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Whether today's check-in is done", body = CheckinStatusResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorBody),
    ),
)]
pub async fn checkin_status(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CheckinStatusResponse>, ApiError> {
    let checked_in_today = service::has_checked_in_today(&state.db, &auth.user_id).await?;
    Ok(Json(CheckinStatusResponse { checked_in_today }))
}
