//! Community endpoints: creation, listing, and membership toggles.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use room_common::id::{prefix, prefixed_ulid};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::{current_profile, AuthUser};
use crate::db::schema::{communities, community_members};
use crate::error::{is_unique_violation, ApiError, ApiErrorBody, FieldError};
use crate::models::community::{Community, NewCommunity};
use crate::models::community_member::NewCommunityMember;
use crate::progression::ledger;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/communities", post(create_community).get(list_communities))
        .route("/communities/{community_id}", get(get_community))
        .route("/communities/{community_id}/membership", put(toggle_membership))
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// POST /api/v1/communities
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCommunityRequest {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    #[serde(default)]
    pub min_level_to_post: i32,
    #[serde(default)]
    pub min_level_to_view: i32,
    #[serde(default)]
    pub require_approval: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/communities",
    tag = "Communities",
    security(("bearer" = [])),
    request_body = CreateCommunityRequest,
    responses(
        (status = 201, description = "Community created", body = Community),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 409, description = "Name already taken", body = ApiErrorBody),
    ),
)]
pub async fn create_community(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateCommunityRequest>,
) -> Result<(axum::http::StatusCode, Json<Community>), ApiError> {
    let profile = current_profile(&state, &auth).await?;

    let mut errors = Vec::new();
    let name = body.name.trim();
    if name.is_empty() || name.len() > 80 {
        errors.push(FieldError {
            field: "name".to_string(),
            message: "Name must be 1-80 characters".to_string(),
        });
    }
    if let Some(desc) = body.description.as_deref() {
        if desc.len() > 500 {
            errors.push(FieldError {
                field: "description".to_string(),
                message: "Description must be 500 characters or fewer".to_string(),
            });
        }
    }
    let max = ledger::max_level();
    if !(0..=max).contains(&body.min_level_to_post) {
        errors.push(FieldError {
            field: "min_level_to_post".to_string(),
            message: format!("Must be between 0 and {max}"),
        });
    }
    if !(0..=max).contains(&body.min_level_to_view) {
        errors.push(FieldError {
            field: "min_level_to_view".to_string(),
            message: format!("Must be between 0 and {max}"),
        });
    }
    let slug = slugify(name);
    if slug.is_empty() {
        errors.push(FieldError {
            field: "name".to_string(),
            message: "Name must contain at least one letter or digit".to_string(),
        });
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let mut conn = state.db.get().await?;
    let id = prefixed_ulid(prefix::COMMUNITY);
    let now = Utc::now();

    let insert = diesel_async::RunQueryDsl::get_result(
        diesel::insert_into(communities::table)
            .values(NewCommunity {
                id: &id,
                name,
                slug: &slug,
                description: body.description.as_deref(),
                icon_url: body.icon_url.as_deref(),
                min_level_to_post: body.min_level_to_post,
                min_level_to_view: body.min_level_to_view,
                require_approval: body.require_approval,
                owner_id: &profile.id,
                member_count: 1,
                created_at: now,
            })
            .returning(Community::as_returning()),
        &mut conn,
    )
    .await;

    let community: Community = match insert {
        Ok(c) => c,
        // Slug carries a unique index.
        Err(err) if is_unique_violation(&err) => {
            return Err(ApiError::conflict("A community with this name already exists"))
        }
        Err(err) => return Err(err.into()),
    };

    // The owner is a member from the start.
    diesel_async::RunQueryDsl::execute(
        diesel::insert_into(community_members::table)
            .values(NewCommunityMember {
                community_id: &community.id,
                user_id: &profile.id,
                role: "owner",
                joined_at: now,
            })
            .on_conflict_do_nothing(),
        &mut conn,
    )
    .await?;

    tracing::info!(community_id = %community.id, owner_id = %profile.id, "community created");

    Ok((axum::http::StatusCode::CREATED, Json(community)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/communities",
    tag = "Communities",
    responses((status = 200, description = "All communities", body = [Community])),
)]
pub async fn list_communities(
    State(state): State<AppState>,
) -> Result<Json<Vec<Community>>, ApiError> {
    let mut conn = state.db.get().await?;

    let rows: Vec<Community> = diesel_async::RunQueryDsl::load(
        communities::table
            .order(communities::member_count.desc())
            .select(Community::as_select()),
        &mut conn,
    )
    .await?;

    Ok(Json(rows))
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities/:community_id
// ---------------------------------------------------------------------------

/// Lookup by id or slug; slugs are what clients link to.
#[utoipa::path(
    get,
    path = "/api/v1/communities/{community_id}",
    tag = "Communities",
    responses(
        (status = 200, description = "Community details", body = Community),
        (status = 404, description = "Community not found", body = ApiErrorBody),
    ),
)]
pub async fn get_community(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> Result<Json<Community>, ApiError> {
    let mut conn = state.db.get().await?;

    let community: Community = diesel_async::RunQueryDsl::get_result(
        communities::table
            .filter(
                communities::id
                    .eq(&community_id)
                    .or(communities::slug.eq(&community_id)),
            )
            .select(Community::as_select()),
        &mut conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Community not found"))?;

    Ok(Json(community))
}

// ---------------------------------------------------------------------------
// PUT /api/v1/communities/:community_id/membership
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipResponse {
    /// True when the caller is now a member, false after leaving.
    pub member: bool,
    pub member_count: i32,
}

/// Toggle the caller's membership. Owners cannot leave their own community.
#[utoipa::path(
    put,
    path = "/api/v1/communities/{community_id}/membership",
    tag = "Communities",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Toggle result", body = MembershipResponse),
        (status = 400, description = "Owner cannot leave", body = ApiErrorBody),
        (status = 404, description = "Community not found", body = ApiErrorBody),
    ),
)]
pub async fn toggle_membership(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let profile = current_profile(&state, &auth).await?;
    let mut conn = state.db.get().await?;

    let community: Community = diesel_async::RunQueryDsl::get_result(
        communities::table
            .find(&community_id)
            .select(Community::as_select()),
        &mut conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("Community not found"))?;

    if community.owner_id == profile.id {
        return Err(ApiError::bad_request(
            "The owner cannot leave their own community",
        ));
    }

    let removed = diesel_async::RunQueryDsl::execute(
        diesel::delete(
            community_members::table
                .filter(community_members::community_id.eq(&community_id))
                .filter(community_members::user_id.eq(&profile.id)),
        ),
        &mut conn,
    )
    .await?;

    let (member, delta) = if removed > 0 {
        (false, -1)
    } else {
        let insert = diesel_async::RunQueryDsl::execute(
            diesel::insert_into(community_members::table).values(NewCommunityMember {
                community_id: &community_id,
                user_id: &profile.id,
                role: "member",
                joined_at: Utc::now(),
            }),
            &mut conn,
        )
        .await;

        match insert {
            Ok(_) => (true, 1),
            Err(err) if is_unique_violation(&err) => (true, 0),
            Err(err) => return Err(err.into()),
        }
    };

    // member_count is a denormalized convenience counter, floored at zero.
    let updated: Community = diesel_async::RunQueryDsl::get_result(
        diesel::update(communities::table.find(&community_id))
            .set(
                communities::member_count.eq(diesel::dsl::sql::<diesel::sql_types::Integer>(
                    "GREATEST(member_count + ",
                )
                .bind::<diesel::sql_types::Integer, _>(delta)
                .sql(", 0)")),
            )
            .returning(Community::as_returning()),
        &mut conn,
    )
    .await?;

    Ok(Json(MembershipResponse {
        member,
        member_count: updated.member_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Study Room  VN"), "study-room-vn");
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Phòng học"), "ph-ng-h-c");
        assert_eq!(slugify("!!!"), "");
    }
}
