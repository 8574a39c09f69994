//! Auth routes: identity-token login and token refresh.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{identity, tokens};
use crate::error::{ApiError, ApiErrorBody};
use crate::i18n::Locale;
use crate::models::profile::{self, ProfileResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// JWT issued by the identity provider.
    pub identity_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub ws_ticket: String,
    pub profile: ProfileResponse,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid identity token", body = ApiErrorBody),
        (status = 403, description = "Account is blocked", body = ApiErrorBody),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let claims = identity::validate_identity_token(
        &body.identity_token,
        &state.config.identity_issuer,
        &state.config.identity_secret,
    )?;

    // Honor the provider's locale hint for new profiles only.
    let language = claims
        .locale
        .as_deref()
        .map(|l| Locale::parse(l).as_str())
        .unwrap_or(&state.config.default_language);

    let profile = profile::upsert_from_identity(
        &state.db,
        &claims.sub,
        &claims.email,
        &claims.name,
        claims.avatar_url.as_deref(),
        language,
    )
    .await?;

    if profile.is_blocked() {
        return Err(ApiError::forbidden("This account is blocked"));
    }

    let access = tokens::generate_access_token();
    let refresh = tokens::generate_refresh_token();
    let ws_ticket = tokens::generate_ws_ticket();

    let kv = state.kv.as_ref();
    tokens::store_access_token(
        kv,
        &access,
        &tokens::AccessData {
            user_id: profile.id.clone(),
        },
    )
    .await?;
    tokens::store_refresh_token(
        kv,
        &refresh,
        &tokens::RefreshData {
            user_id: profile.id.clone(),
        },
    )
    .await?;
    tokens::store_ws_ticket(
        kv,
        &ws_ticket,
        &tokens::WsTicketData {
            user_id: profile.id.clone(),
        },
    )
    .await?;

    tracing::info!(user_id = %profile.id, "user logged in");

    Ok(Json(LoginResponse {
        access_token: access,
        token_type: "Bearer".to_string(),
        expires_in: tokens::ACCESS_TTL_SECS,
        refresh_token: refresh,
        ws_ticket,
        profile: ProfileResponse::from(profile),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub ws_ticket: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = RefreshResponse),
        (status = 401, description = "Invalid refresh token", body = ApiErrorBody),
    ),
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let kv = state.kv.as_ref();

    let data = tokens::consume_refresh_token(kv, &body.refresh_token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired refresh token"))?;

    let access = tokens::generate_access_token();
    let refresh = tokens::generate_refresh_token();
    let ws_ticket = tokens::generate_ws_ticket();

    tokens::store_access_token(
        kv,
        &access,
        &tokens::AccessData {
            user_id: data.user_id.clone(),
        },
    )
    .await?;
    tokens::store_refresh_token(
        kv,
        &refresh,
        &tokens::RefreshData {
            user_id: data.user_id.clone(),
        },
    )
    .await?;
    tokens::store_ws_ticket(
        kv,
        &ws_ticket,
        &tokens::WsTicketData {
            user_id: data.user_id,
        },
    )
    .await?;

    Ok(Json(RefreshResponse {
        access_token: access,
        token_type: "Bearer".to_string(),
        expires_in: tokens::ACCESS_TTL_SECS,
        refresh_token: refresh,
        ws_ticket,
    }))
}
