pub mod auth;
pub mod badges;
pub mod checkins;
pub mod communities;
pub mod conversations;
pub mod follows;
pub mod health;
pub mod moderation;
pub mod notifications;
pub mod posts;
pub mod profiles;

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::realtime::server::router())
        .nest(
            "/api/v1",
            auth::router()
                .merge(profiles::router())
                .merge(checkins::router())
                .merge(posts::router())
                .merge(moderation::router())
                .merge(follows::router())
                .merge(notifications::router())
                .merge(badges::router())
                .merge(communities::router())
                .merge(conversations::router()),
        )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Auth
        auth::login,
        auth::refresh,
        // Profiles
        profiles::get_me,
        profiles::update_me,
        profiles::get_user,
        profiles::set_level,
        profiles::image_quota,
        profiles::leaderboard,
        // Check-ins
        checkins::perform_checkin,
        checkins::checkin_status,
        // Posts
        posts::create_post,
        posts::list_posts,
        posts::get_post,
        posts::delete_post,
        posts::toggle_like,
        posts::create_comment,
        posts::list_comments,
        // Moderation
        moderation::cast_vote,
        moderation::list_approvals,
        moderation::approve_post,
        moderation::reject_post,
        // Follows
        follows::toggle_follow,
        follows::follow_counts,
        // Notifications
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_all_read,
        // Badges
        badges::list_badges,
        badges::list_user_badges,
        // Communities
        communities::create_community,
        communities::list_communities,
        communities::get_community,
        communities::toggle_membership,
        // Conversations
        conversations::open_conversation,
        conversations::list_conversations,
        conversations::list_messages,
        conversations::send_message,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Models
            crate::models::profile::Profile,
            crate::models::profile::ProfileResponse,
            crate::models::post::Post,
            crate::models::comment::Comment,
            crate::models::community::Community,
            crate::models::community_member::CommunityMember,
            crate::models::notification::Notification,
            crate::models::badge::Badge,
            crate::models::badge::UserBadge,
            crate::models::conversation::Conversation,
            crate::models::conversation::DirectMessage,
            crate::progression::service::ImageQuota,
            // Route request/response types
            health::HealthResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RefreshRequest,
            auth::RefreshResponse,
            profiles::UpdateMeRequest,
            profiles::SetLevelRequest,
            checkins::CheckinResponse,
            checkins::CheckinStatusResponse,
            posts::CreatePostRequest,
            posts::AuthorInfo,
            posts::PostView,
            posts::ListPostsResponse,
            posts::ToggleLikeResponse,
            posts::CreateCommentRequest,
            moderation::VoteResponse,
            moderation::ApprovalsResponse,
            follows::FollowResponse,
            follows::FollowCountsResponse,
            notifications::NotificationsPage,
            notifications::UnreadCountResponse,
            notifications::ReadAllResponse,
            badges::EarnedBadge,
            communities::CreateCommunityRequest,
            communities::MembershipResponse,
            conversations::OpenConversationRequest,
            conversations::ConversationView,
            conversations::MessagesPage,
            conversations::SendMessageRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Auth", description = "Authentication"),
        (name = "Profiles", description = "User profiles"),
        (name = "Progression", description = "XP, levels, check-ins and badges"),
        (name = "Posts", description = "Posts, likes and comments"),
        (name = "Moderation", description = "Post approval workflow"),
        (name = "Social", description = "Follow graph"),
        (name = "Notifications", description = "Notification inbox"),
        (name = "Communities", description = "Communities and membership"),
        (name = "Conversations", description = "Direct messages"),
    )
)]
pub struct ApiDoc;
