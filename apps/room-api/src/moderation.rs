//! Post moderation policy: lifecycle transitions and read-side visibility.
//!
//! Status is a three-state machine: `pending -> approved` and
//! `pending -> rejected`, both terminal. Community votes on a pending post
//! are advisory — tallied and displayed, never flipping status on their own;
//! only an admin transitions a post. Rejected has no resurrection path.
//!
//! Visibility is re-derived on every read from the post row and the viewer,
//! never cached.

use crate::models::post::{Post, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED};
use crate::models::profile::Profile;

/// The status a new post is created with, given its target context's policy.
/// Global posts have no approval queue and go straight to `approved`.
pub fn initial_status(require_approval: bool) -> &'static str {
    if require_approval {
        STATUS_PENDING
    } else {
        STATUS_APPROVED
    }
}

/// Whether `new_status` is a legal admin transition from `current`.
///
/// Only `pending` posts can move, and only to one of the two terminal
/// states.
pub fn admin_transition_allowed(current: &str, new_status: &str) -> bool {
    current == STATUS_PENDING
        && (new_status == STATUS_APPROVED || new_status == STATUS_REJECTED)
}

/// Whether the viewer may see that the post exists at all.
///
/// `pending` posts are listed for everyone (with a pending banner and vote
/// affordance); `rejected` posts only for their author and admins.
pub fn can_view(viewer: Option<&Profile>, post: &Post) -> bool {
    match post.status.as_str() {
        STATUS_REJECTED => match viewer {
            Some(v) => v.is_admin() || v.id == post.author_id,
            None => false,
        },
        _ => true,
    }
}

/// Whether the post body is rendered for the viewer, or replaced by a
/// "locked, requires level N" placeholder.
pub fn can_view_body(viewer: Option<&Profile>, post: &Post) -> bool {
    if post.min_level_to_view <= 0 {
        return true;
    }
    match viewer {
        Some(v) => {
            v.is_admin() || v.id == post.author_id || v.level >= post.min_level_to_view
        }
        None => false,
    }
}
