use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::notifications;

pub const TYPE_LIKE: &str = "like";
pub const TYPE_COMMENT: &str = "comment";
pub const TYPE_BADGE: &str = "badge";
pub const TYPE_SYSTEM: &str = "system";

#[derive(Debug, Clone, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub actor_id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
    pub post_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification<'a> {
    pub id: &'a str,
    pub recipient_id: &'a str,
    pub actor_id: Option<&'a str>,
    pub type_: &'a str,
    pub message: &'a str,
    pub post_id: Option<&'a str>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
