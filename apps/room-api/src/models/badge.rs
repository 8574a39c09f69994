use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::{badges, user_badges};

/// Static badge reference data, seeded by migration.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = badges)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// When set, the badge is awarded automatically upon reaching this level.
    pub min_level: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// An award record; created once per (user, badge), never removed.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = user_badges)]
pub struct UserBadge {
    pub user_id: String,
    pub badge_id: String,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_badges)]
pub struct NewUserBadge<'a> {
    pub user_id: &'a str,
    pub badge_id: &'a str,
    pub awarded_at: DateTime<Utc>,
}
