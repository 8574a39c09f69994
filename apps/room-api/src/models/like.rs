use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::likes;

/// Set membership for "user likes post". The (user, post) primary key is the
/// source of truth; `posts.likes_count` is derived.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike<'a> {
    pub user_id: &'a str,
    pub post_id: &'a str,
    pub created_at: DateTime<Utc>,
}
