use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::profiles;
use crate::i18n::Locale;
use crate::progression::ledger;

/// A user profile, created on first sign-in from the identity provider.
///
/// Profiles are never hard-deleted; `status` flips to `blocked` instead.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub level: i32,
    pub xp: i32,
    pub role: String,
    pub status: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn is_blocked(&self) -> bool {
        self.status == "blocked"
    }

    pub fn locale(&self) -> Locale {
        Locale::parse(&self.language)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub display_name: &'a str,
    pub avatar_url: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub level: i32,
    pub xp: i32,
    pub role: &'a str,
    pub status: &'a str,
    pub language: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile plus ledger-derived progression, as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub rank_name: String,
    pub rank_style: String,
    pub xp_into_level: i32,
    pub xp_to_next_level: i32,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        let progress = ledger::level_for_xp(profile.xp);
        let locale = profile.locale();
        Self {
            rank_name: progress.rank.name(locale).to_string(),
            rank_style: progress.rank.style.to_string(),
            xp_into_level: progress.xp_into_level,
            xp_to_next_level: progress.xp_to_next_level,
            profile,
        }
    }
}

/// Upsert a profile from validated identity claims. Creates the row on first
/// sign-in; later logins refresh the mutable identity fields only (level, xp
/// and role are owned by this service).
pub async fn upsert_from_identity(
    pool: &crate::db::pool::DbPool,
    user_id: &str,
    email: &str,
    display_name: &str,
    avatar_url: Option<&str>,
    default_language: &str,
) -> Result<Profile, crate::error::ApiError> {
    let now = Utc::now();
    let mut conn = pool.get().await?;

    let query = diesel::insert_into(profiles::table)
        .values(NewProfile {
            id: user_id,
            email,
            display_name,
            avatar_url,
            bio: None,
            level: 1,
            xp: 0,
            role: "member",
            status: "active",
            language: default_language,
            created_at: now,
            updated_at: now,
        })
        .on_conflict(profiles::id)
        .do_update()
        .set((
            profiles::email.eq(email),
            profiles::avatar_url.eq(avatar_url),
            profiles::updated_at.eq(now),
        ))
        .returning(Profile::as_returning());

    let profile: Profile = diesel_async::RunQueryDsl::get_result(query, &mut conn).await?;

    Ok(profile)
}

/// Load a profile by id.
pub async fn find(
    pool: &crate::db::pool::DbPool,
    user_id: &str,
) -> Result<Option<Profile>, crate::error::ApiError> {
    use diesel::result::OptionalExtension;

    let mut conn = pool.get().await?;
    let profile = diesel_async::RunQueryDsl::get_result(
        profiles::table.find(user_id).select(Profile::as_select()),
        &mut conn,
    )
    .await
    .optional()?;

    Ok(profile)
}
