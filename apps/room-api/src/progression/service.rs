//! The progression service: XP awards, daily check-ins, level-ups, and the
//! rank-based image-post quota.
//!
//! XP only ever increases here; the one exception is the admin `set_level`
//! escape hatch, which writes level and xp directly. Exclusivity of the
//! daily check-in rests on the (user, date) primary key, not on any
//! application-level locking.

use chrono::{DateTime, Datelike, Days, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection};
use scoped_futures::ScopedFutureExt;

use crate::db::pool::DbPool;
use crate::db::schema::{badges, daily_checkins, posts, profiles, user_badges};
use crate::error::{ApiError, FieldError};
use crate::i18n::{self, Locale};
use crate::models::badge::{Badge, NewUserBadge};
use crate::models::checkin::NewDailyCheckin;
use crate::models::notification;
use crate::models::profile::Profile;
use crate::notify;
use crate::progression::ledger;
use crate::realtime::events;
use crate::AppState;

/// XP awarded for a daily check-in.
pub const XP_CHECKIN: i32 = 3;
/// XP awarded when a post of yours becomes visible (created approved, or
/// approved by an admin).
pub const XP_POST_APPROVED: i32 = 5;

/// Outcome of an XP award, captured inside the transaction.
#[derive(Debug, Clone, Copy)]
pub struct XpAward {
    pub xp: i32,
    pub old_level: i32,
    pub new_level: i32,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.old_level
    }
}

/// Add `amount` XP to a profile and recompute its level from the ledger, on
/// an open connection (composable into a larger transaction).
///
/// Rejects non-positive amounts: there is no XP-deduction path in this
/// design.
pub async fn award_xp(
    conn: &mut AsyncPgConnection,
    profile_id: &str,
    amount: i32,
) -> Result<XpAward, ApiError> {
    if amount <= 0 {
        return Err(ApiError::validation(vec![FieldError {
            field: "amount".to_string(),
            message: "XP amount must be positive".to_string(),
        }]));
    }

    let (xp, old_level): (i32, i32) = diesel_async::RunQueryDsl::get_result(
        diesel::update(profiles::table.find(profile_id))
            .set(profiles::xp.eq(profiles::xp + amount))
            .returning((profiles::xp, profiles::level)),
        conn,
    )
    .await?;

    let new_level = ledger::level_for_xp(xp).level;
    if new_level != old_level {
        diesel_async::RunQueryDsl::execute(
            diesel::update(profiles::table.find(profile_id))
                .set(profiles::level.eq(new_level)),
            conn,
        )
        .await?;
    }

    Ok(XpAward {
        xp,
        old_level,
        new_level,
    })
}

/// Post-commit side effects of a level-up: award newly eligible badges,
/// fan out badge notifications, and dispatch a LEVEL_UP event.
///
/// Best-effort by design — a failure here is logged and never unwinds the
/// XP award that triggered it.
pub async fn apply_level_up_effects(
    state: &AppState,
    profile_id: &str,
    locale: Locale,
    award: &XpAward,
) {
    if !award.leveled_up() {
        return;
    }

    tracing::info!(
        user_id = %profile_id,
        from = award.old_level,
        to = award.new_level,
        "level up"
    );

    state.broadcast.dispatch(
        events::Audience::User(profile_id.to_string()),
        events::LEVEL_UP,
        serde_json::json!({
            "user_id": profile_id,
            "level": award.new_level,
            "xp": award.xp,
        }),
    );

    if let Err(err) = unlock_level_badges(state, profile_id, locale, award.new_level).await {
        tracing::warn!(?err, user_id = %profile_id, "badge unlock failed");
    }
}

/// Award every level-gated badge the user is now eligible for. The
/// (user, badge) primary key makes re-awards a no-op.
async fn unlock_level_badges(
    state: &AppState,
    profile_id: &str,
    locale: Locale,
    level: i32,
) -> Result<(), ApiError> {
    let mut conn = state.db.get().await?;

    let eligible: Vec<Badge> = diesel_async::RunQueryDsl::load(
        badges::table
            .filter(badges::min_level.le(level))
            .select(Badge::as_select()),
        &mut conn,
    )
    .await?;

    let now = Utc::now();
    for badge in eligible {
        let inserted = diesel_async::RunQueryDsl::execute(
            diesel::insert_into(user_badges::table)
                .values(NewUserBadge {
                    user_id: profile_id,
                    badge_id: &badge.id,
                    awarded_at: now,
                })
                .on_conflict_do_nothing(),
            &mut conn,
        )
        .await?;

        if inserted > 0 {
            let message = i18n::with_badge(i18n::messages(locale).badge_unlocked, &badge.name);
            notify::fan_out(
                state,
                profile_id,
                None,
                notification::TYPE_BADGE,
                &message,
                None,
            )
            .await;
        }
    }

    Ok(())
}

/// Result of a check-in attempt. The duplicate case is a success-shaped
/// no-op, not an error.
#[derive(Debug)]
pub struct CheckinOutcome {
    pub checked_in: bool,
    pub message: String,
    pub award: Option<XpAward>,
}

/// Perform the once-per-day check-in for `profile`.
///
/// The check-in row insert and the XP award commit or roll back together;
/// a concurrent duplicate loses on the (user, date) key and sees zero rows
/// inserted.
pub async fn perform_daily_checkin(
    state: &AppState,
    profile: &Profile,
) -> Result<CheckinOutcome, ApiError> {
    let locale = profile.locale();
    let today = Utc::now().date_naive();
    let mut conn = state.db.get().await?;

    let profile_id = profile.id.clone();
    let award = conn
        .transaction::<Option<XpAward>, ApiError, _>(|conn| {
            async move {
                let inserted = diesel_async::RunQueryDsl::execute(
                    diesel::insert_into(daily_checkins::table)
                        .values(NewDailyCheckin {
                            user_id: &profile_id,
                            checkin_date: today,
                            created_at: Utc::now(),
                        })
                        .on_conflict_do_nothing(),
                    conn,
                )
                .await?;

                if inserted == 0 {
                    return Ok(None);
                }

                let award = award_xp(conn, &profile_id, XP_CHECKIN).await?;
                Ok(Some(award))
            }
            .scope_boxed()
        })
        .await?;

    let messages = i18n::messages(locale);
    match award {
        Some(award) => {
            apply_level_up_effects(state, &profile.id, locale, &award).await;
            Ok(CheckinOutcome {
                checked_in: true,
                message: messages.checkin_success.to_string(),
                award: Some(award),
            })
        }
        None => Ok(CheckinOutcome {
            checked_in: false,
            message: messages.already_checked_in.to_string(),
            award: None,
        }),
    }
}

/// Whether the user already checked in today.
pub async fn has_checked_in_today(pool: &DbPool, profile_id: &str) -> Result<bool, ApiError> {
    let today = Utc::now().date_naive();
    let mut conn = pool.get().await?;

    let count: i64 = diesel_async::RunQueryDsl::get_result(
        daily_checkins::table
            .filter(daily_checkins::user_id.eq(profile_id))
            .filter(daily_checkins::checkin_date.eq(today))
            .count(),
        &mut conn,
    )
    .await?;

    Ok(count > 0)
}

/// The rank-dependent image-post allowance for the current week.
#[derive(Debug, Clone, Copy, serde::Serialize, utoipa::ToSchema)]
pub struct ImageQuota {
    /// Posts allowed per week; `None` means unlimited.
    pub limit: Option<i32>,
    /// Image posts already created this week.
    pub used: i32,
    /// Posts still allowed; `None` means unlimited.
    pub remaining: Option<i32>,
}

impl ImageQuota {
    pub fn exhausted(&self) -> bool {
        matches!(self.remaining, Some(r) if r <= 0)
    }
}

/// Start of the current UTC week (Monday 00:00).
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
    monday.and_hms_opt(0, 0, 0).expect("valid midnight").and_utc()
}

/// Remaining image-post allowance, from the rank perk and this week's usage.
///
/// Callers must consult this before persisting the post (and before any
/// image upload happens) so quota failures never leave orphaned uploads.
pub async fn image_post_quota(pool: &DbPool, profile: &Profile) -> Result<ImageQuota, ApiError> {
    let rank = ledger::rank_for_level(profile.level);

    let mut conn = pool.get().await?;
    let used: i64 = diesel_async::RunQueryDsl::get_result(
        posts::table
            .filter(posts::author_id.eq(&profile.id))
            .filter(posts::image_url.is_not_null())
            .filter(posts::created_at.ge(week_start(Utc::now())))
            .count(),
        &mut conn,
    )
    .await?;
    let used = used as i32;

    Ok(ImageQuota {
        limit: rank.image_posts_per_week,
        used,
        remaining: rank.image_posts_per_week.map(|limit| limit - used),
    })
}

/// Admin escape hatch: set a user's level directly and snap xp to that
/// rank's threshold, bypassing the derived-from-xp invariant for this one
/// write.
pub async fn set_level(
    pool: &DbPool,
    target_id: &str,
    level: i32,
) -> Result<Profile, ApiError> {
    if level < 1 || level > ledger::max_level() {
        return Err(ApiError::validation(vec![FieldError {
            field: "level".to_string(),
            message: format!("Level must be between 1 and {}", ledger::max_level()),
        }]));
    }

    let rank = ledger::rank_for_level(level);
    let mut conn = pool.get().await?;

    use diesel::result::OptionalExtension;
    let profile: Profile = diesel_async::RunQueryDsl::get_result(
        diesel::update(profiles::table.find(target_id))
            .set((
                profiles::level.eq(rank.level),
                profiles::xp.eq(rank.min_xp),
                profiles::updated_at.eq(Utc::now()),
            ))
            .returning(Profile::as_returning()),
        &mut conn,
    )
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn week_starts_on_monday_utc() {
        // Wednesday 2025-06-04 15:30 UTC → Monday 2025-06-02 00:00 UTC.
        let wed = Utc.with_ymd_and_hms(2025, 6, 4, 15, 30, 0).unwrap();
        let start = week_start(wed);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn monday_is_its_own_week_start() {
        let mon = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        assert_eq!(week_start(mon), mon);

        let mon_late = Utc.with_ymd_and_hms(2025, 6, 2, 23, 59, 59).unwrap();
        assert_eq!(week_start(mon_late), mon);
    }

    #[test]
    fn sunday_belongs_to_the_preceding_monday() {
        let sun = Utc.with_ymd_and_hms(2025, 6, 8, 12, 0, 0).unwrap();
        assert_eq!(week_start(sun), Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn quota_arithmetic() {
        let q = ImageQuota {
            limit: Some(2),
            used: 2,
            remaining: Some(0),
        };
        assert!(q.exhausted());

        let q = ImageQuota {
            limit: Some(2),
            used: 1,
            remaining: Some(1),
        };
        assert!(!q.exhausted());

        // Unlimited rank never exhausts.
        let q = ImageQuota {
            limit: None,
            used: 500,
            remaining: None,
        };
        assert!(!q.exhausted());
    }

    #[test]
    fn xp_award_level_up_flag() {
        let award = XpAward {
            xp: 9,
            old_level: 1,
            new_level: 2,
        };
        assert!(award.leveled_up());

        let award = XpAward {
            xp: 6,
            old_level: 1,
            new_level: 1,
        };
        assert!(!award.leveled_up());
    }
}
