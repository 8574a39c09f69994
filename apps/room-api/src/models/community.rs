use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::communities;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = communities)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub min_level_to_post: i32,
    pub min_level_to_view: i32,
    /// When true, new posts enter the moderation queue as `pending`.
    pub require_approval: bool,
    pub owner_id: String,
    pub member_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = communities)]
pub struct NewCommunity<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub icon_url: Option<&'a str>,
    pub min_level_to_post: i32,
    pub min_level_to_view: i32,
    pub require_approval: bool,
    pub owner_id: &'a str,
    pub member_count: i32,
    pub created_at: DateTime<Utc>,
}
