use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::post_approvals;

/// A community member's advisory vote to approve a pending post. One row per
/// (post, voter); never mutated, removed only when the post is deleted.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = post_approvals)]
pub struct PostApproval {
    pub post_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = post_approvals)]
pub struct NewPostApproval<'a> {
    pub post_id: &'a str,
    pub user_id: &'a str,
    pub created_at: DateTime<Utc>,
}
