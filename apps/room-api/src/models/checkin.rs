use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::db::schema::daily_checkins;

/// One row per (user, calendar day). The primary key is what makes the
/// daily check-in idempotent under concurrent requests.
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = daily_checkins)]
pub struct DailyCheckin {
    pub user_id: String,
    pub checkin_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = daily_checkins)]
pub struct NewDailyCheckin<'a> {
    pub user_id: &'a str,
    pub checkin_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
