//! The XP ledger: the pure mapping between accumulated XP and level.
//!
//! Ranks are static reference data ordered by ascending `min_xp`. A user's
//! level is always the highest rank whose threshold they have crossed;
//! nothing here touches the database.

use crate::i18n::Locale;

/// A named tier in the progression ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub level: i32,
    pub name_en: &'static str,
    pub name_vi: &'static str,
    /// Minimum accumulated XP to hold this rank.
    pub min_xp: i32,
    /// UI style token for the rank color.
    pub style: &'static str,
    /// Image-bearing posts allowed per week; `None` means unlimited.
    pub image_posts_per_week: Option<i32>,
}

impl Rank {
    pub fn name(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.name_en,
            Locale::Vi => self.name_vi,
        }
    }
}

/// The rank ladder, ascending by `min_xp`. Level 1 must start at 0.
pub static RANKS: &[Rank] = &[
    Rank {
        level: 1,
        name_en: "Newcomer",
        name_vi: "Người mới",
        min_xp: 0,
        style: "slate",
        image_posts_per_week: Some(1),
    },
    Rank {
        level: 2,
        name_en: "Learner",
        name_vi: "Học viên",
        min_xp: 8,
        style: "green",
        image_posts_per_week: Some(2),
    },
    Rank {
        level: 3,
        name_en: "Explorer",
        name_vi: "Nhà khám phá",
        min_xp: 25,
        style: "blue",
        image_posts_per_week: Some(3),
    },
    Rank {
        level: 4,
        name_en: "Achiever",
        name_vi: "Người chinh phục",
        min_xp: 60,
        style: "purple",
        image_posts_per_week: Some(5),
    },
    Rank {
        level: 5,
        name_en: "Mentor",
        name_vi: "Người dẫn dắt",
        min_xp: 150,
        style: "orange",
        image_posts_per_week: Some(10),
    },
    Rank {
        level: 6,
        name_en: "Legend",
        name_vi: "Huyền thoại",
        min_xp: 400,
        style: "gold",
        image_posts_per_week: None,
    },
];

/// A user's position in the ladder, derived from raw XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub level: i32,
    pub rank: &'static Rank,
    /// XP earned past this rank's threshold.
    pub xp_into_level: i32,
    /// XP still needed for the next rank; 0 at the maximum level.
    pub xp_to_next_level: i32,
}

/// The rank for a given level, clamped to the defined range.
pub fn rank_for_level(level: i32) -> &'static Rank {
    let idx = (level - 1).clamp(0, RANKS.len() as i32 - 1) as usize;
    &RANKS[idx]
}

/// The highest rank whose `min_xp` is at or below `xp`.
///
/// Negative input is treated as 0 so a caller can never observe a level
/// below 1.
pub fn level_for_xp(xp: i32) -> Progress {
    let xp = xp.max(0);

    let idx = RANKS
        .iter()
        .rposition(|r| r.min_xp <= xp)
        .unwrap_or(0);
    let rank = &RANKS[idx];

    let xp_to_next_level = match RANKS.get(idx + 1) {
        Some(next) => next.min_xp - xp,
        // Max level: report zero rather than erroring.
        None => 0,
    };

    Progress {
        level: rank.level,
        rank,
        xp_into_level: xp - rank.min_xp,
        xp_to_next_level,
    }
}

/// Highest defined level.
pub fn max_level() -> i32 {
    RANKS[RANKS.len() - 1].level
}
