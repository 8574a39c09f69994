//! Bearer-token extraction middleware.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::tokens;
use crate::error::ApiError;
use crate::models::profile::{self, Profile};
use crate::AppState;

/// Authenticated user extracted from the `Authorization: Bearer <token>`
/// header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Rejection returned when the bearer token is missing or invalid.
pub struct AuthError {
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "UNAUTHORIZED",
                "message": self.message
            }
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError {
                message: "Missing Authorization header",
            })?;

        let token = header.strip_prefix("Bearer ").ok_or(AuthError {
            message: "Invalid Authorization header format",
        })?;

        let data = tokens::lookup_access_token(state.kv.as_ref(), token)
            .await
            .map_err(|_| AuthError {
                message: "Token lookup failed",
            })?
            .ok_or(AuthError {
                message: "Invalid or expired token",
            })?;

        Ok(AuthUser {
            user_id: data.user_id,
        })
    }
}

/// Like `AuthUser`, but absent rather than rejecting when no token is
/// presented. Read endpoints use this to apply per-viewer visibility.
#[derive(Debug, Clone, Default)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if parts.headers.get(AUTHORIZATION).is_none() {
            return Ok(MaybeAuthUser(None));
        }
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

/// Load the authenticated user's profile, rejecting blocked accounts.
pub async fn current_profile(state: &AppState, auth: &AuthUser) -> Result<Profile, ApiError> {
    let profile = profile::find(&state.db, &auth.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Profile not found"))?;

    if profile.is_blocked() {
        return Err(ApiError::forbidden("This account is blocked"));
    }

    Ok(profile)
}

/// Load the viewer's profile when a token was presented, if any.
pub async fn maybe_profile(
    state: &AppState,
    maybe: &MaybeAuthUser,
) -> Result<Option<Profile>, ApiError> {
    match &maybe.0 {
        Some(auth) => Ok(Some(current_profile(state, auth).await?)),
        None => Ok(None),
    }
}
