//! Server-side localization.
//!
//! The API produces a handful of user-facing strings (check-in results,
//! level-up toasts, lock placeholders). They are selected by key from a
//! static table per locale; no language logic lives anywhere else.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supported UI languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Vi,
}

impl Locale {
    /// Parse a profile's `language` column, falling back to English.
    pub fn parse(s: &str) -> Self {
        match s {
            "vi" => Locale::Vi,
            _ => Locale::En,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Vi => "vi",
        }
    }
}

/// The full set of server-produced messages for one locale.
pub struct Messages {
    pub checkin_success: &'static str,
    pub already_checked_in: &'static str,
    pub level_up: &'static str,
    pub badge_unlocked: &'static str,
    pub image_limit_reached: &'static str,
    pub already_voted: &'static str,
    pub vote_recorded: &'static str,
    pub post_approved: &'static str,
    pub post_rejected: &'static str,
    pub liked_your_post: &'static str,
    pub commented_on_your_post: &'static str,
    /// `{level}` is substituted with the required level.
    pub level_required: &'static str,
}

static EN: Messages = Messages {
    checkin_success: "Check-in successful! +3 XP",
    already_checked_in: "Already checked in today",
    level_up: "Level Up! You reached level {level}",
    badge_unlocked: "Badge unlocked: {badge}",
    image_limit_reached: "Image post limit reached for this week",
    already_voted: "You already voted on this post",
    vote_recorded: "Vote recorded",
    post_approved: "Your post was approved",
    post_rejected: "Your post was rejected",
    liked_your_post: "liked your post",
    commented_on_your_post: "commented on your post",
    level_required: "Level {level} required to view this content",
};

static VI: Messages = Messages {
    checkin_success: "Điểm danh thành công! +3 XP",
    already_checked_in: "Hôm nay bạn đã điểm danh rồi",
    level_up: "Lên cấp! Bạn đã đạt cấp {level}",
    badge_unlocked: "Mở khóa huy hiệu: {badge}",
    image_limit_reached: "Đã hết lượt đăng ảnh trong tuần này",
    already_voted: "Bạn đã bình chọn cho bài viết này",
    vote_recorded: "Đã ghi nhận bình chọn",
    post_approved: "Bài viết của bạn đã được duyệt",
    post_rejected: "Bài viết của bạn đã bị từ chối",
    liked_your_post: "đã thích bài viết của bạn",
    commented_on_your_post: "đã bình luận bài viết của bạn",
    level_required: "Cần đạt cấp {level} để xem nội dung này",
};

/// Look up the message table for a locale.
pub fn messages(locale: Locale) -> &'static Messages {
    match locale {
        Locale::En => &EN,
        Locale::Vi => &VI,
    }
}

/// Substitute `{level}` in a template.
pub fn with_level(template: &str, level: i32) -> String {
    template.replace("{level}", &level.to_string())
}

/// Substitute `{badge}` in a template.
pub fn with_badge(template: &str, badge: &str) -> String {
    template.replace("{badge}", badge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_falls_back_to_english() {
        assert_eq!(Locale::parse("vi"), Locale::Vi);
        assert_eq!(Locale::parse("en"), Locale::En);
        assert_eq!(Locale::parse("fr"), Locale::En);
        assert_eq!(Locale::parse(""), Locale::En);
    }

    #[test]
    fn level_substitution() {
        let msg = with_level(messages(Locale::En).level_required, 5);
        assert_eq!(msg, "Level 5 required to view this content");

        let msg = with_level(messages(Locale::Vi).level_required, 5);
        assert!(msg.contains('5'));
        assert!(!msg.contains("{level}"));
    }

    #[test]
    fn every_template_has_its_placeholder() {
        for m in [&EN, &VI] {
            assert!(m.level_up.contains("{level}"));
            assert!(m.level_required.contains("{level}"));
            assert!(m.badge_unlocked.contains("{badge}"));
        }
    }
}
