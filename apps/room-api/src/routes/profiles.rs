//! Profile endpoints, including the admin set-level escape hatch and the
//! XP leaderboard.

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::{current_profile, AuthUser};
use crate::db::schema::profiles;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::i18n::Locale;
use crate::models::profile::{self, Profile, ProfileResponse};
use crate::progression::service;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/@me", get(get_me).patch(update_me))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/level", patch(set_level))
        .route("/users/@me/image-quota", get(image_quota))
        .route("/leaderboard", get(leaderboard))
}

// ---------------------------------------------------------------------------
// GET /api/v1/users/@me
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/users/@me",
    tag = "Profiles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The current user's profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorBody),
    ),
)]
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = current_profile(&state, &auth).await?;
    Ok(Json(ProfileResponse::from(profile)))
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/users/@me
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub language: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/@me",
    tag = "Profiles",
    security(("bearer" = [])),
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
    ),
)]
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = current_profile(&state, &auth).await?;

    let mut errors = Vec::new();
    if let Some(name) = body.display_name.as_deref() {
        if name.trim().is_empty() || name.len() > 80 {
            errors.push(FieldError {
                field: "display_name".to_string(),
                message: "Display name must be 1-80 characters".to_string(),
            });
        }
    }
    if let Some(bio) = body.bio.as_deref() {
        if bio.len() > 500 {
            errors.push(FieldError {
                field: "bio".to_string(),
                message: "Bio must be 500 characters or fewer".to_string(),
            });
        }
    }
    if let Some(lang) = body.language.as_deref() {
        if !matches!(lang, "en" | "vi") {
            errors.push(FieldError {
                field: "language".to_string(),
                message: "Language must be one of: en, vi".to_string(),
            });
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let mut conn = state.db.get().await?;

    let updated: Profile = diesel_async::RunQueryDsl::get_result(
        diesel::update(profiles::table.find(&profile.id))
            .set((
                body.display_name
                    .as_deref()
                    .map(|v| profiles::display_name.eq(v.trim().to_string())),
                body.bio.map(|v| profiles::bio.eq(v)),
                body.avatar_url.map(|v| profiles::avatar_url.eq(v)),
                body.language
                    .as_deref()
                    .map(|v| profiles::language.eq(Locale::parse(v).as_str().to_string())),
                profiles::updated_at.eq(Utc::now()),
            ))
            .returning(Profile::as_returning()),
        &mut conn,
    )
    .await?;

    Ok(Json(ProfileResponse::from(updated)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/users/:user_id
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Profiles",
    responses(
        (status = 200, description = "A user's public profile", body = ProfileResponse),
        (status = 404, description = "User not found", body = ApiErrorBody),
    ),
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = profile::find(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ProfileResponse::from(profile)))
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/users/:user_id/level (admin)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetLevelRequest {
    pub level: i32,
}

/// Admin escape hatch: sets the target's level directly and snaps xp to the
/// rank threshold, bypassing the earned-xp path.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}/level",
    tag = "Profiles",
    security(("bearer" = [])),
    request_body = SetLevelRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Level out of range", body = ApiErrorBody),
        (status = 403, description = "Admin only", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody),
    ),
)]
pub async fn set_level(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<SetLevelRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let admin = current_profile(&state, &auth).await?;
    if !admin.is_admin() {
        return Err(ApiError::forbidden("Only admins can set levels"));
    }

    let updated = service::set_level(&state.db, &user_id, body.level).await?;

    tracing::info!(
        admin_id = %admin.id,
        target_id = %user_id,
        level = body.level,
        "admin set level"
    );

    Ok(Json(ProfileResponse::from(updated)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/users/@me/image-quota
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/users/@me/image-quota",
    tag = "Progression",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Remaining image-post allowance this week", body = service::ImageQuota),
    ),
)]
pub async fn image_quota(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<service::ImageQuota>, ApiError> {
    let profile = current_profile(&state, &auth).await?;
    let quota = service::image_post_quota(&state.db, &profile).await?;
    Ok(Json(quota))
}

// ---------------------------------------------------------------------------
// GET /api/v1/leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/leaderboard",
    tag = "Progression",
    responses((status = 200, description = "Top users by XP", body = [ProfileResponse])),
)]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let mut conn = state.db.get().await?;

    let rows: Vec<Profile> = diesel_async::RunQueryDsl::load(
        profiles::table
            .filter(profiles::status.eq("active"))
            .order((profiles::xp.desc(), profiles::created_at.asc()))
            .limit(limit)
            .select(Profile::as_select()),
        &mut conn,
    )
    .await?;

    Ok(Json(rows.into_iter().map(ProfileResponse::from).collect()))
}
