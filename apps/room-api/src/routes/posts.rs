//! Post endpoints: creation, the feed, likes, and comments.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use room_common::id;
use scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::{current_profile, maybe_profile, AuthUser, MaybeAuthUser};
use crate::db::schema::{comments, communities, community_members, likes, posts};
use crate::error::{is_unique_violation, ApiError, ApiErrorBody, FieldError};
use crate::i18n;
use crate::models::comment::{Comment, NewComment};
use crate::models::community::Community;
use crate::models::like::NewLike;
use crate::models::notification;
use crate::models::post::{Post, NewPost, STATUS_APPROVED};
use crate::models::profile::Profile;
use crate::moderation;
use crate::notify;
use crate::progression::service;
use crate::progression::ledger;
use crate::realtime::events;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post).get(list_posts))
        .route(
            "/posts/{post_id}",
            axum::routing::get(get_post).delete(delete_post),
        )
        .route("/posts/{post_id}/like", put(toggle_like))
        .route(
            "/posts/{post_id}/comments",
            post(create_comment).get(list_comments),
        )
}

// ---------------------------------------------------------------------------
// Shared view types
// ---------------------------------------------------------------------------

/// The author slice embedded in a post view.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorInfo {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub level: i32,
    pub rank_name: String,
}

impl AuthorInfo {
    fn from_profile(p: &Profile) -> Self {
        let rank = ledger::rank_for_level(p.level);
        Self {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            avatar_url: p.avatar_url.clone(),
            level: p.level,
            rank_name: rank.name(p.locale()).to_string(),
        }
    }
}

/// A post as rendered for a specific viewer. The body is withheld behind
/// the level gate; visibility itself is decided before this is built.
#[derive(Debug, Serialize, ToSchema)]
pub struct PostView {
    pub id: String,
    pub author: AuthorInfo,
    pub community_id: Option<String>,
    pub title: Option<String>,
    /// `None` when the viewer has not unlocked the level gate.
    pub content: Option<String>,
    /// `None` when the viewer has not unlocked the level gate.
    pub image_url: Option<String>,
    pub locked: bool,
    /// Localized placeholder shown in place of a locked body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_message: Option<String>,
    pub topic: String,
    pub status: String,
    pub min_level_to_view: i32,
    pub likes_count: i32,
    pub comments_count: i32,
    pub liked_by_user: bool,
    pub created_at: DateTime<Utc>,
}

/// Render a post for a viewer. The level gate is re-derived on every call,
/// never cached.
fn render_post(
    post: Post,
    author: &Profile,
    viewer: Option<&Profile>,
    liked_by_user: bool,
) -> PostView {
    let unlocked = moderation::can_view_body(viewer, &post);
    let locale = viewer.map(|v| v.locale()).unwrap_or(i18n::Locale::En);

    let lock_message = (!unlocked).then(|| {
        i18n::with_level(
            i18n::messages(locale).level_required,
            post.min_level_to_view,
        )
    });

    PostView {
        id: post.id,
        author: AuthorInfo::from_profile(author),
        community_id: post.community_id,
        title: post.title,
        content: unlocked.then_some(post.content),
        image_url: if unlocked { post.image_url } else { None },
        locked: !unlocked,
        lock_message,
        topic: post.topic,
        status: post.status,
        min_level_to_view: post.min_level_to_view,
        likes_count: post.likes_count,
        comments_count: post.comments_count,
        liked_by_user,
        created_at: post.created_at,
    }
}

// ---------------------------------------------------------------------------
// POST /api/v1/posts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub content: Option<String>,
    pub title: Option<String>,
    /// Public URL of an already-uploaded image.
    pub image_url: Option<String>,
    pub community_id: Option<String>,
    pub topic: Option<String>,
    pub min_level_to_view: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "Posts",
    security(("bearer" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostView),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 403, description = "Level or quota restriction", body = ApiErrorBody),
        (status = 404, description = "Community not found", body = ApiErrorBody),
    ),
)]
pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let profile = current_profile(&state, &auth).await?;

    // Validate content.
    let content = body.content.as_deref().map(|s| s.trim());
    let mut errors = Vec::new();
    match content {
        None | Some("") => {
            errors.push(FieldError {
                field: "content".to_string(),
                message: "Post content is required".to_string(),
            });
        }
        Some(c) if c.len() > 4000 => {
            errors.push(FieldError {
                field: "content".to_string(),
                message: "Post content must be 4000 characters or fewer".to_string(),
            });
        }
        _ => {}
    }
    if let Some(title) = body.title.as_deref() {
        if title.len() > 200 {
            errors.push(FieldError {
                field: "title".to_string(),
                message: "Title must be 200 characters or fewer".to_string(),
            });
        }
    }
    let min_level_to_view = body.min_level_to_view.unwrap_or(0);
    if min_level_to_view < 0 {
        errors.push(FieldError {
            field: "min_level_to_view".to_string(),
            message: "Minimum level must not be negative".to_string(),
        });
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }
    let content = content.unwrap();

    // Resolve the community policy, if any. Global posts need no approval.
    let mut conn = state.db.get().await?;
    let community: Option<Community> = match body.community_id.as_deref() {
        Some(community_id) => {
            let community: Community = diesel_async::RunQueryDsl::get_result(
                communities::table
                    .find(community_id)
                    .select(Community::as_select()),
                &mut conn,
            )
            .await
            .optional()?
            .ok_or_else(|| ApiError::not_found("Community not found"))?;

            let is_member: i64 = diesel_async::RunQueryDsl::get_result(
                community_members::table
                    .find((community_id, &profile.id))
                    .count(),
                &mut conn,
            )
            .await?;
            if is_member == 0 {
                return Err(ApiError::forbidden("Join the community before posting"));
            }

            if profile.level < community.min_level_to_post && !profile.is_admin() {
                return Err(ApiError::forbidden(format!(
                    "Level {} required to post in this community",
                    community.min_level_to_post
                )));
            }

            Some(community)
        }
        None => None,
    };

    // Quota gate before the post is persisted (and before any upload would
    // happen client-side on retry).
    if body.image_url.is_some() {
        let quota = service::image_post_quota(&state.db, &profile).await?;
        if quota.exhausted() {
            return Err(ApiError::quota_exceeded(
                i18n::messages(profile.locale()).image_limit_reached,
            ));
        }
    }

    let status = moderation::initial_status(
        community.as_ref().map(|c| c.require_approval).unwrap_or(false),
    );

    let post_id = id::prefixed_ulid(id::prefix::POST);
    let now = Utc::now();

    let profile_id = profile.id.clone();
    let topic = body.topic.as_deref().unwrap_or("share");
    let (created, award) = {
        let post_id = post_id.clone();
        let community_id = body.community_id.clone();
        let title = body.title.clone();
        let image_url = body.image_url.clone();
        let content = content.to_string();
        let topic = topic.to_string();
        use diesel_async::AsyncConnection;
        conn.transaction::<(Post, Option<service::XpAward>), ApiError, _>(|conn| {
            async move {
                let created: Post = diesel_async::RunQueryDsl::get_result(
                    diesel::insert_into(posts::table)
                        .values(NewPost {
                            id: &post_id,
                            author_id: &profile_id,
                            community_id: community_id.as_deref(),
                            title: title.as_deref(),
                            content: &content,
                            image_url: image_url.as_deref(),
                            topic: &topic,
                            status,
                            min_level_to_view,
                            likes_count: 0,
                            comments_count: 0,
                            created_at: now,
                            updated_at: now,
                        })
                        .returning(Post::as_returning()),
                    conn,
                )
                .await?;

                // Direct-approved posts earn XP immediately; pending posts
                // earn it when an admin approves.
                let award = if status == STATUS_APPROVED {
                    Some(service::award_xp(conn, &profile_id, service::XP_POST_APPROVED).await?)
                } else {
                    None
                };

                Ok((created, award))
            }
            .scope_boxed()
        })
        .await?
    };

    if let Some(award) = &award {
        service::apply_level_up_effects(&state, &profile.id, profile.locale(), award).await;
    }

    state.broadcast.dispatch(
        events::Audience::Global,
        events::POST_CREATE,
        serde_json::json!({
            "id": created.id,
            "author_id": created.author_id,
            "community_id": created.community_id,
            "status": created.status,
            "likes_count": 0,
            "comments_count": 0,
        }),
    );

    tracing::info!(post_id = %created.id, author_id = %profile.id, status, "post created");

    let view = render_post(created, &profile, Some(&profile), false);
    Ok((StatusCode::CREATED, Json(view)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/posts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    pub community_id: Option<String>,
    pub topic: Option<String>,
    pub status: Option<String>,
    /// Return posts with an id lexicographically below this one (ULIDs sort
    /// by creation time).
    pub before: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListPostsResponse {
    pub data: Vec<PostView>,
    pub has_more: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    tag = "Posts",
    responses((status = 200, description = "Feed page", body = ListPostsResponse)),
)]
pub async fn list_posts(
    maybe: MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<ListPostsResponse>, ApiError> {
    let viewer = maybe_profile(&state, &maybe).await?;
    let limit = params.limit.unwrap_or(20).clamp(1, 50);

    let mut conn = state.db.get().await?;

    let mut query = posts::table
        .inner_join(crate::db::schema::profiles::table)
        .order(posts::id.desc())
        .limit(limit + 1)
        .into_boxed();

    if let Some(community_id) = &params.community_id {
        query = query.filter(posts::community_id.eq(community_id.clone()));
    }
    if let Some(topic) = params.topic.as_deref().filter(|t| *t != "all") {
        query = query.filter(posts::topic.eq(topic.to_string()));
    }
    if let Some(status) = &params.status {
        query = query.filter(posts::status.eq(status.clone()));
    }
    if let Some(before) = &params.before {
        query = query.filter(posts::id.lt(before.clone()));
    }

    let rows: Vec<(Post, Profile)> = diesel_async::RunQueryDsl::load(
        query.select((Post::as_select(), Profile::as_select())),
        &mut conn,
    )
    .await?;

    let has_more = rows.len() as i64 > limit;
    let rows: Vec<(Post, Profile)> = rows.into_iter().take(limit as usize).collect();

    // Visibility is re-derived per viewer; rejected posts drop out of the
    // page for everyone but their author and admins.
    let visible: Vec<(Post, Profile)> = rows
        .into_iter()
        .filter(|(post, _)| moderation::can_view(viewer.as_ref(), post))
        .collect();

    // Like membership for the viewer, for the posts on this page.
    let liked: std::collections::HashSet<String> = match &viewer {
        Some(v) => {
            let ids: Vec<&str> = visible.iter().map(|(p, _)| p.id.as_str()).collect();
            let rows: Vec<String> = diesel_async::RunQueryDsl::load(
                likes::table
                    .filter(likes::user_id.eq(&v.id))
                    .filter(likes::post_id.eq_any(ids))
                    .select(likes::post_id),
                &mut conn,
            )
            .await?;
            rows.into_iter().collect()
        }
        None => Default::default(),
    };

    let data = visible
        .into_iter()
        .map(|(post, author)| {
            let liked_by_user = liked.contains(&post.id);
            render_post(post, &author, viewer.as_ref(), liked_by_user)
        })
        .collect();

    Ok(Json(ListPostsResponse { data, has_more }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/posts/:post_id
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}",
    tag = "Posts",
    responses(
        (status = 200, description = "The post", body = PostView),
        (status = 404, description = "Post not found or not visible", body = ApiErrorBody),
    ),
)]
pub async fn get_post(
    maybe: MaybeAuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    let viewer = maybe_profile(&state, &maybe).await?;
    let mut conn = state.db.get().await?;

    let row: (Post, Profile) = diesel_async::RunQueryDsl::get_result(
        posts::table
            .inner_join(crate::db::schema::profiles::table)
            .filter(posts::id.eq(&post_id))
            .select((Post::as_select(), Profile::as_select())),
        &mut conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let (post, author) = row;

    // A post the viewer may not see is indistinguishable from a missing one.
    if !moderation::can_view(viewer.as_ref(), &post) {
        return Err(ApiError::not_found("Post not found"));
    }

    let liked_by_user = match &viewer {
        Some(v) => {
            let count: i64 = diesel_async::RunQueryDsl::get_result(
                likes::table.find((&v.id, &post.id)).count(),
                &mut conn,
            )
            .await?;
            count > 0
        }
        None => false,
    };

    Ok(Json(render_post(post, &author, viewer.as_ref(), liked_by_user)))
}

// ---------------------------------------------------------------------------
// DELETE /api/v1/posts/:post_id
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{post_id}",
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the author or an admin", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let profile = current_profile(&state, &auth).await?;
    let mut conn = state.db.get().await?;

    let post: Post = diesel_async::RunQueryDsl::get_result(
        posts::table.find(&post_id).select(Post::as_select()),
        &mut conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if post.author_id != profile.id && !profile.is_admin() {
        return Err(ApiError::forbidden("Only the author or an admin can delete a post"));
    }

    // Likes, comments and approval votes go with it (ON DELETE CASCADE).
    diesel_async::RunQueryDsl::execute(diesel::delete(posts::table.find(&post_id)), &mut conn)
        .await?;

    state.broadcast.dispatch(
        events::Audience::Global,
        events::POST_DELETE,
        serde_json::json!({ "id": post_id }),
    );

    tracing::info!(%post_id, deleted_by = %profile.id, "post deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// PUT /api/v1/posts/:post_id/like
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleLikeResponse {
    pub liked: bool,
    pub likes_count: i32,
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{post_id}/like",
    tag = "Posts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Like membership after the toggle", body = ToggleLikeResponse),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn toggle_like(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<ToggleLikeResponse>, ApiError> {
    let profile = current_profile(&state, &auth).await?;
    let mut conn = state.db.get().await?;

    let post: Post = diesel_async::RunQueryDsl::get_result(
        posts::table.find(&post_id).select(Post::as_select()),
        &mut conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    // Membership row is authoritative; the counter is derived. Try the
    // delete first so the toggle direction follows current membership.
    let deleted = diesel_async::RunQueryDsl::execute(
        diesel::delete(likes::table.find((&profile.id, &post_id))),
        &mut conn,
    )
    .await?;

    let liked = if deleted > 0 {
        false
    } else {
        let insert = diesel_async::RunQueryDsl::execute(
            diesel::insert_into(likes::table).values(NewLike {
                user_id: &profile.id,
                post_id: &post_id,
                created_at: Utc::now(),
            }),
            &mut conn,
        )
        .await;
        match insert {
            Ok(_) => true,
            // A concurrent toggle won the race; membership already holds.
            Err(err) if is_unique_violation(&err) => true,
            Err(err) => return Err(err.into()),
        }
    };

    let delta = if liked { 1 } else { -1 };
    let likes_count: i32 = diesel_async::RunQueryDsl::get_result(
        diesel::update(posts::table.find(&post_id))
            .set(posts::likes_count.eq(diesel::dsl::sql::<diesel::sql_types::Integer>(
                "GREATEST(likes_count + ",
            )
            .bind::<diesel::sql_types::Integer, _>(delta)
            .sql(", 0)")))
            .returning(posts::likes_count),
        &mut conn,
    )
    .await?;

    if liked {
        // Notification text is in the recipient's language.
        let author_locale = author_locale(&state, &post.author_id).await;
        let message = format!(
            "{} {}",
            profile.display_name,
            i18n::messages(author_locale).liked_your_post
        );
        notify::fan_out(
            &state,
            &post.author_id,
            Some(&profile.id),
            notification::TYPE_LIKE,
            &message,
            Some(&post_id),
        )
        .await;
    }

    state.broadcast.dispatch(
        events::Audience::Global,
        events::POST_UPDATE,
        serde_json::json!({
            "id": post_id,
            "likes_count": likes_count,
            "comments_count": post.comments_count,
            "status": post.status,
        }),
    );

    Ok(Json(ToggleLikeResponse { liked, likes_count }))
}

/// Language preference of a post's author, for localizing notifications.
/// Falls back to English when the lookup fails.
async fn author_locale(state: &AppState, author_id: &str) -> i18n::Locale {
    match crate::models::profile::find(&state.db, author_id).await {
        Ok(Some(p)) => p.locale(),
        _ => i18n::Locale::En,
    }
}

// ---------------------------------------------------------------------------
// POST /api/v1/posts/:post_id/comments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/comments",
    tag = "Posts",
    security(("bearer" = [])),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = Comment),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let profile = current_profile(&state, &auth).await?;

    let content = body.content.as_deref().map(|s| s.trim());
    let content = match content {
        None | Some("") => {
            return Err(ApiError::validation(vec![FieldError {
                field: "content".to_string(),
                message: "Comment content is required".to_string(),
            }]))
        }
        Some(c) if c.len() > 1000 => {
            return Err(ApiError::validation(vec![FieldError {
                field: "content".to_string(),
                message: "Comment content must be 1000 characters or fewer".to_string(),
            }]))
        }
        Some(c) => c,
    };

    let mut conn = state.db.get().await?;

    let post: Post = diesel_async::RunQueryDsl::get_result(
        posts::table.find(&post_id).select(Post::as_select()),
        &mut conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let comment_id = id::prefixed_ulid(id::prefix::COMMENT);
    let now = Utc::now();

    let comment: Comment = diesel_async::RunQueryDsl::get_result(
        diesel::insert_into(comments::table)
            .values(NewComment {
                id: &comment_id,
                post_id: &post_id,
                author_id: &profile.id,
                content,
                created_at: now,
            })
            .returning(Comment::as_returning()),
        &mut conn,
    )
    .await?;

    let comments_count: i32 = diesel_async::RunQueryDsl::get_result(
        diesel::update(posts::table.find(&post_id))
            .set(posts::comments_count.eq(posts::comments_count + 1))
            .returning(posts::comments_count),
        &mut conn,
    )
    .await?;

    let author_locale = author_locale(&state, &post.author_id).await;
    let message = format!(
        "{} {}",
        profile.display_name,
        i18n::messages(author_locale).commented_on_your_post
    );
    notify::fan_out(
        &state,
        &post.author_id,
        Some(&profile.id),
        notification::TYPE_COMMENT,
        &message,
        Some(&post_id),
    )
    .await;

    state.broadcast.dispatch(
        events::Audience::Global,
        events::POST_UPDATE,
        serde_json::json!({
            "id": post_id,
            "likes_count": post.likes_count,
            "comments_count": comments_count,
            "status": post.status,
        }),
    );

    Ok((StatusCode::CREATED, Json(comment)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/posts/:post_id/comments
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/comments",
    tag = "Posts",
    responses(
        (status = 200, description = "Comments, oldest first", body = [Comment]),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let mut conn = state.db.get().await?;

    diesel_async::RunQueryDsl::get_result::<String>(
        posts::table.find(&post_id).select(posts::id),
        &mut conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let rows: Vec<Comment> = diesel_async::RunQueryDsl::load(
        comments::table
            .filter(comments::post_id.eq(&post_id))
            .order(comments::created_at.asc())
            .select(Comment::as_select()),
        &mut conn,
    )
    .await?;

    Ok(Json(rows))
}
