use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::posts;

/// Moderation lifecycle states. Stored as text in the `status` column.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub community_id: Option<String>,
    pub title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub topic: String,
    pub status: String,
    pub min_level_to_view: i32,
    pub likes_count: i32,
    pub comments_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost<'a> {
    pub id: &'a str,
    pub author_id: &'a str,
    pub community_id: Option<&'a str>,
    pub title: Option<&'a str>,
    pub content: &'a str,
    pub image_url: Option<&'a str>,
    pub topic: &'a str,
    pub status: &'a str,
    pub min_level_to_view: i32,
    pub likes_count: i32,
    pub comments_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
