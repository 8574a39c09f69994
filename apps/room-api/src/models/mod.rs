pub mod approval;
pub mod badge;
pub mod checkin;
pub mod comment;
pub mod community;
pub mod community_member;
pub mod conversation;
pub mod follow;
pub mod like;
pub mod notification;
pub mod post;
pub mod profile;
