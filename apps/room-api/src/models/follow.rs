use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::follows;

/// A directed follow edge. The composite primary key forbids duplicates and
/// a CHECK constraint forbids self-follows.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = follows)]
pub struct Follow {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = follows)]
pub struct NewFollow<'a> {
    pub follower_id: &'a str,
    pub following_id: &'a str,
    pub created_at: DateTime<Utc>,
}
