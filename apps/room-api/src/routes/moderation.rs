//! Moderation endpoints: community approval votes and admin transitions.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use scoped_futures::ScopedFutureExt;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::{current_profile, AuthUser};
use crate::db::schema::{post_approvals, posts, profiles};
use crate::error::{is_unique_violation, ApiError, ApiErrorBody};
use crate::i18n;
use crate::models::approval::NewPostApproval;
use crate::models::notification;
use crate::models::post::{Post, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED};
use crate::moderation;
use crate::notify;
use crate::progression::service;
use crate::realtime::events;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/{post_id}/approvals",
            post(cast_vote).get(list_approvals),
        )
        .route("/posts/{post_id}/approve", post(approve_post))
        .route("/posts/{post_id}/reject", post(reject_post))
}

async fn load_post(
    conn: &mut diesel_async::AsyncPgConnection,
    post_id: &str,
) -> Result<Post, ApiError> {
    diesel_async::RunQueryDsl::get_result(
        posts::table.find(post_id).select(Post::as_select()),
        conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Post not found"))
}

// ---------------------------------------------------------------------------
// POST /api/v1/posts/:post_id/approvals
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    /// False when this user had already voted (no-op).
    pub vote_recorded: bool,
    pub message: String,
    pub approvals_count: i64,
}

/// Cast an advisory approval vote on a pending post. Votes are tallied and
/// displayed; only an admin transition changes the post's status.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/approvals",
    tag = "Moderation",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Vote outcome", body = VoteResponse),
        (status = 400, description = "Post is not pending", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn cast_vote(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<VoteResponse>, ApiError> {
    let profile = current_profile(&state, &auth).await?;
    let mut conn = state.db.get().await?;

    let post = load_post(&mut conn, &post_id).await?;
    if post.status != STATUS_PENDING {
        return Err(ApiError::bad_request("Votes apply to pending posts only"));
    }

    let insert = diesel_async::RunQueryDsl::execute(
        diesel::insert_into(post_approvals::table).values(NewPostApproval {
            post_id: &post_id,
            user_id: &profile.id,
            created_at: Utc::now(),
        }),
        &mut conn,
    )
    .await;

    let messages = i18n::messages(profile.locale());
    let vote_recorded = match insert {
        Ok(_) => true,
        // The (post, voter) key already holds: idempotent no-op.
        Err(err) if is_unique_violation(&err) => false,
        Err(err) => return Err(err.into()),
    };

    let approvals_count: i64 = diesel_async::RunQueryDsl::get_result(
        post_approvals::table
            .filter(post_approvals::post_id.eq(&post_id))
            .count(),
        &mut conn,
    )
    .await?;

    Ok(Json(VoteResponse {
        vote_recorded,
        message: if vote_recorded {
            messages.vote_recorded.to_string()
        } else {
            messages.already_voted.to_string()
        },
        approvals_count,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/posts/:post_id/approvals
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalsResponse {
    pub approvals_count: i64,
    pub voters: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/approvals",
    tag = "Moderation",
    responses(
        (status = 200, description = "Vote tally", body = ApprovalsResponse),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn list_approvals(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<ApprovalsResponse>, ApiError> {
    let mut conn = state.db.get().await?;
    load_post(&mut conn, &post_id).await?;

    let voters: Vec<String> = diesel_async::RunQueryDsl::load(
        post_approvals::table
            .filter(post_approvals::post_id.eq(&post_id))
            .order(post_approvals::created_at.asc())
            .select(post_approvals::user_id),
        &mut conn,
    )
    .await?;

    Ok(Json(ApprovalsResponse {
        approvals_count: voters.len() as i64,
        voters,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/posts/:post_id/approve and /reject (admin)
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/approve",
    tag = "Moderation",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Post approved", body = crate::models::post::Post),
        (status = 400, description = "Post is not pending", body = ApiErrorBody),
        (status = 403, description = "Admin only", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn approve_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    admin_transition(auth, state, post_id, STATUS_APPROVED).await
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/reject",
    tag = "Moderation",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Post rejected", body = crate::models::post::Post),
        (status = 400, description = "Post is not pending", body = ApiErrorBody),
        (status = 403, description = "Admin only", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn reject_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    admin_transition(auth, state, post_id, STATUS_REJECTED).await
}

async fn admin_transition(
    auth: AuthUser,
    state: AppState,
    post_id: String,
    new_status: &'static str,
) -> Result<Json<Post>, ApiError> {
    let profile = current_profile(&state, &auth).await?;
    if !profile.is_admin() {
        return Err(ApiError::forbidden("Only admins can moderate posts"));
    }

    let mut conn = state.db.get().await?;

    let (updated, award) = {
        let post_id = post_id.clone();
        use diesel_async::AsyncConnection;
        conn.transaction::<(Post, Option<service::XpAward>), ApiError, _>(|conn| {
            async move {
                let post = load_post(conn, &post_id).await?;

                if !moderation::admin_transition_allowed(&post.status, new_status) {
                    return Err(ApiError::bad_request(format!(
                        "Cannot move a {} post to {}",
                        post.status, new_status
                    )));
                }

                let updated: Post = diesel_async::RunQueryDsl::get_result(
                    diesel::update(posts::table.find(&post_id))
                        .set((
                            posts::status.eq(new_status),
                            posts::updated_at.eq(Utc::now()),
                        ))
                        .returning(Post::as_returning()),
                    conn,
                )
                .await?;

                // Approval is when a pending post finally earns its XP.
                let award = if new_status == STATUS_APPROVED {
                    Some(
                        service::award_xp(conn, &updated.author_id, service::XP_POST_APPROVED)
                            .await?,
                    )
                } else {
                    None
                };

                Ok((updated, award))
            }
            .scope_boxed()
        })
        .await?
    };

    // Author-facing side effects, outside the transaction.
    let author_locale: i18n::Locale = {
        let language: Option<String> = diesel_async::RunQueryDsl::get_result(
            profiles::table
                .find(&updated.author_id)
                .select(profiles::language),
            &mut conn,
        )
        .await
        .optional()?;
        i18n::Locale::parse(language.as_deref().unwrap_or("en"))
    };

    if let Some(award) = &award {
        service::apply_level_up_effects(&state, &updated.author_id, author_locale, award).await;
    }

    let messages = i18n::messages(author_locale);
    let message = if new_status == STATUS_APPROVED {
        messages.post_approved
    } else {
        messages.post_rejected
    };
    notify::fan_out(
        &state,
        &updated.author_id,
        Some(&profile.id),
        notification::TYPE_SYSTEM,
        message,
        Some(&updated.id),
    )
    .await;

    state.broadcast.dispatch(
        events::Audience::Global,
        events::POST_UPDATE,
        serde_json::json!({
            "id": updated.id,
            "likes_count": updated.likes_count,
            "comments_count": updated.comments_count,
            "status": updated.status,
        }),
    );

    tracing::info!(
        post_id = %updated.id,
        admin_id = %profile.id,
        status = new_status,
        "admin moderation transition"
    );

    Ok(Json(updated))
}
